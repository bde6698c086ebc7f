//! QKart storefront client library.
//!
//! Talks to the QKart backend and keeps the client-side state of a shopper:
//! the logged-in session, the product catalog, the reconciled cart and
//! debounced product search. [`Storefront`] ties these together.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod search;
pub mod session;
pub mod state;

pub use config::StorefrontConfig;
pub use error::{Notice, Severity, StorefrontError};
pub use state::Storefront;
