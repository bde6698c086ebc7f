//! Product search.
//!
//! Searches run against the backend. Typing is debounced by
//! [`SearchDebouncer`]: only the last query entered before the input goes
//! quiet is sent, and a newer query aborts any older one still in flight.
//!
//! A failed search and a search with no matches both end in the
//! [`SearchOutcome::NotFound`] state the user sees as "No products found";
//! [`NotFoundReason`] keeps the two apart for callers that care.

mod debounce;

pub use debounce::{Debouncer, SearchDebouncer};

use std::future::Future;

use qkart_core::Product;

use crate::api::{ApiError, QKartClient};

/// Message shown for [`SearchOutcome::NotFound`].
pub const NOT_FOUND_MESSAGE: &str = "No products found";

/// Something that can run a product search.
pub trait ProductSearch: Send + Sync + 'static {
    /// Search products matching `query`.
    fn search_products(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;
}

impl ProductSearch for QKartClient {
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        self.search(query).await
    }
}

/// Why a search shows no products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The backend answered with no products.
    Empty,
    /// The request failed; carries the error text.
    Failed(String),
}

/// Result of a search as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Matching products, in backend order.
    Found(Vec<Product>),
    /// Nothing to show.
    NotFound(NotFoundReason),
}

impl SearchOutcome {
    /// Map a search result onto the user-visible outcome.
    #[must_use]
    pub fn from_result(result: Result<Vec<Product>, ApiError>) -> Self {
        match result {
            Ok(products) if products.is_empty() => Self::NotFound(NotFoundReason::Empty),
            Ok(products) => Self::Found(products),
            Err(e) => {
                tracing::warn!(error = %e, "Search failed");
                Self::NotFound(NotFoundReason::Failed(e.to_string()))
            }
        }
    }

    /// Products found, empty when not found.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        match self {
            Self::Found(products) => products,
            Self::NotFound(_) => &[],
        }
    }

    /// Whether this is the not-found state.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Progress of the debounced search, published to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchState {
    /// No search has run yet.
    #[default]
    Idle,
    /// A request for `query` is in flight.
    Loading { query: String },
    /// The search for `query` finished.
    Done { query: String, outcome: SearchOutcome },
}
