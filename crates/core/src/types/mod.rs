//! Core types for the QKart storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;
pub mod username;

pub use cart::{CartLineItem, RawCartEntry};
pub use id::ProductId;
pub use price::Price;
pub use product::{Product, ProductList, Rating, product_list};
pub use username::{Username, UsernameError};
