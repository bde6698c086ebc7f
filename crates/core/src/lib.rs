//! QKart Core - Shared storefront types.
//!
//! This crate provides the domain types used across the QKart client components:
//! - `storefront` - API client, session store, catalog, cart and search
//! - `cli` - Command-line front end driving the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Products, cart entries, prices and type-safe identifiers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
