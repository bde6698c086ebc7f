//! In-memory product catalog.
//!
//! The catalog is fetched once and then shared read-only. Readers take a
//! [`ProductList`] snapshot, so a refresh never changes the products a
//! reconciliation pass is already working with.

use std::sync::{Arc, PoisonError, RwLock};

use qkart_core::ProductList;

/// The full product list as last fetched.
///
/// Starts empty; cart reconciliation against an empty catalog simply yields
/// no lines until the catalog is loaded.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<RwLock<ProductList>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::from(Vec::new()))),
        }
    }

    /// Current product list.
    #[must_use]
    pub fn snapshot(&self) -> ProductList {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the product list.
    pub fn replace(&self, products: ProductList) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = products;
    }
}
