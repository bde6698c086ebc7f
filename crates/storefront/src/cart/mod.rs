//! Shopping cart.
//!
//! - [`reconcile`] joins backend entries with the catalog
//! - [`CartService`] guards and issues cart requests
//! - [`CartState`] holds the latest reconciled cart
//!
//! Overlapping requests are resolved last-request-wins: every request takes
//! a ticket before it is sent, and a response is only applied if no
//! later-issued request has been applied already.

pub mod reconcile;
mod service;

pub use reconcile::{contains, item_count, reconcile, total_cost};
pub use service::{CartApi, CartService};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use qkart_core::{CartLineItem, Price, ProductId};
use thiserror::Error;
use tracing::debug;

use crate::api::ApiError;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No session token; nothing was sent.
    #[error("login required")]
    LoginRequired,

    /// Product is already in the cart; nothing was sent.
    #[error("product {0} is already in the cart")]
    Duplicate(ProductId),

    /// Backend request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Reconciled cart with its totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSummary {
    /// Cart lines in backend order.
    pub items: Vec<CartLineItem>,
    /// Sum of line costs.
    pub total_cost: Price,
    /// Sum of quantities.
    pub item_count: u32,
}

impl CartSummary {
    /// Summarize reconciled cart lines.
    #[must_use]
    pub fn new(items: Vec<CartLineItem>) -> Self {
        Self {
            total_cost: total_cost(&items),
            item_count: item_count(&items),
            items,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }
}

/// Ticket identifying one cart request, in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Latest reconciled cart, shared between clones.
#[derive(Clone, Default)]
pub struct CartState {
    inner: Arc<CartStateInner>,
}

#[derive(Default)]
struct CartStateInner {
    issued: AtomicU64,
    current: Mutex<Applied>,
}

#[derive(Default)]
struct Applied {
    ticket: u64,
    summary: CartSummary,
    synced: bool,
}

impl CartState {
    /// Create an empty cart state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a ticket for a request about to be sent.
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        Ticket(self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Apply the cart produced by the request holding `ticket`.
    ///
    /// Returns `false` and keeps the current cart if a later request has
    /// already been applied, or the cart was cleared after the ticket was
    /// issued.
    pub fn apply(&self, ticket: Ticket, items: Vec<CartLineItem>) -> bool {
        let mut current = self
            .inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if ticket.0 <= current.ticket {
            debug!(
                ticket = ticket.0,
                applied = current.ticket,
                "Dropping stale cart response"
            );
            return false;
        }

        current.ticket = ticket.0;
        current.summary = CartSummary::new(items);
        current.synced = true;
        true
    }

    /// Whether a backend response has been applied since the last clear.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .synced
    }

    /// Empty the cart and invalidate every ticket issued so far.
    pub fn clear(&self) {
        let mut current = self
            .inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        current.ticket = self.inner.issued.load(Ordering::SeqCst);
        current.summary = CartSummary::default();
        current.synced = false;
    }

    /// Current cart.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .summary
            .clone()
    }

    /// Current cart lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.summary().items
    }
}
