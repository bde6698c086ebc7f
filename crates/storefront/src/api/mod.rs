//! QKart backend REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP via `reqwest`
//! - The backend is the source of truth for carts - no optimistic local edits
//! - In-memory caching via `moka` for the full product list
//!
//! # Endpoints
//!
//! - `POST /auth/login` - exchange credentials for a bearer token
//! - `GET /products`, `GET /products/search?value=` - catalog
//! - `GET /cart`, `POST /cart` - cart entries (bearer token required)
//!
//! # Example
//!
//! ```rust,ignore
//! use qkart_storefront::api::QKartClient;
//!
//! let client = QKartClient::new(&config.api)?;
//! let products = client.products().await?;
//! let entries = client.get_cart(&token).await?;
//! ```

mod client;
pub mod types;

pub use client::QKartClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the storefront backend.
///
/// Only [`ApiError::Rejected`] carries a message meant for the user; every
/// other variant means the backend could not be reached or did not answer
/// with valid JSON.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with an error status and a `{success:false, message}` body.
    #[error("Rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the response body.
        message: String,
    },

    /// Backend answered with an error status and no usable body.
    #[error("Unexpected status {status}: {}", truncate(.body))]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response parsed but is missing required fields.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// The backend's own message, if this is a structured rejection.
    #[must_use]
    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether the backend answered with a structured rejection.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
