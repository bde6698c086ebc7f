//! Subcommand implementations.
//!
//! Results go to stdout; notices and logs go to stderr.

pub mod auth;
pub mod cart;
pub mod catalog;

use std::io;

use qkart_storefront::StorefrontError;
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Storefront operation failed.
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    /// Writing output or reading input failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// `search` was run without text and without `--interactive`.
    #[error("Search text is required unless --interactive is given")]
    MissingQuery,
}
