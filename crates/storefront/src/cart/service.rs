//! Cart mutations against the backend.
//!
//! Every mutation returns the backend's full cart; callers reconcile that
//! instead of editing their local copy.

use std::future::Future;

use qkart_core::{CartLineItem, ProductId, RawCartEntry};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use crate::api::{ApiError, QKartClient};

use super::CartError;
use super::reconcile::contains;

/// Backend cart operations.
pub trait CartApi: Send + Sync {
    /// Fetch the cart entries for `token`.
    fn fetch_cart(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<RawCartEntry>, ApiError>> + Send;

    /// Set `product_id` to `qty` and return the updated entries.
    fn upsert_quantity(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        qty: u32,
    ) -> impl Future<Output = Result<Vec<RawCartEntry>, ApiError>> + Send;
}

impl CartApi for QKartClient {
    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<RawCartEntry>, ApiError> {
        self.get_cart(token).await
    }

    async fn upsert_quantity(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        qty: u32,
    ) -> Result<Vec<RawCartEntry>, ApiError> {
        self.post_cart(token, product_id, qty).await
    }
}

/// Guards and issues cart requests.
#[derive(Clone)]
pub struct CartService<A> {
    api: A,
}

impl<A: CartApi> CartService<A> {
    /// Create a cart service over `api`.
    pub const fn new(api: A) -> Self {
        Self { api }
    }

    /// Fetch the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LoginRequired` without a request if `token` is
    /// missing, or `CartError::Api` if the request fails.
    #[instrument(skip_all)]
    pub async fn fetch(&self, token: Option<&SecretString>) -> Result<Vec<RawCartEntry>, CartError> {
        let token = require_token(token)?;
        Ok(self.api.fetch_cart(token).await?)
    }

    /// Set the quantity of a product, as the cart sidebar does.
    ///
    /// `qty = 0` is sent as is.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LoginRequired` without a request if `token` is
    /// missing, or `CartError::Api` if the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn upsert_quantity(
        &self,
        token: Option<&SecretString>,
        product_id: &ProductId,
        qty: u32,
    ) -> Result<Vec<RawCartEntry>, CartError> {
        let token = require_token(token)?;
        let entries = self.api.upsert_quantity(token, product_id, qty).await.map_err(|e| {
            warn!(error = %e, "Cart update failed");
            CartError::Api(e)
        })?;
        info!(qty, "Cart quantity updated");
        Ok(entries)
    }

    /// Add one unit of a product that is not yet in the cart.
    ///
    /// # Errors
    ///
    /// Returns, without any request, `CartError::LoginRequired` if `token`
    /// is missing or `CartError::Duplicate` if `current` already has the
    /// product. Returns `CartError::Api` if the request fails.
    #[instrument(skip(self, token, current), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        token: Option<&SecretString>,
        current: &[CartLineItem],
        product_id: &ProductId,
    ) -> Result<Vec<RawCartEntry>, CartError> {
        require_token(token)?;

        if contains(current, product_id.as_str()) {
            info!("Product already in cart");
            return Err(CartError::Duplicate(product_id.clone()));
        }

        self.upsert_quantity(token, product_id, 1).await
    }
}

fn require_token(token: Option<&SecretString>) -> Result<&SecretString, CartError> {
    token
        .filter(|t| !t.expose_secret().is_empty())
        .ok_or(CartError::LoginRequired)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use qkart_core::{Price, Product, product_list};

    use super::*;
    use crate::cart::reconcile::reconcile;

    /// In-memory backend that counts requests.
    #[derive(Clone, Default)]
    pub(crate) struct FakeCartApi {
        pub entries: Arc<Mutex<Vec<RawCartEntry>>>,
        pub calls: Arc<AtomicUsize>,
        pub reject_with: Option<String>,
    }

    impl CartApi for FakeCartApi {
        async fn fetch_cart(&self, _token: &SecretString) -> Result<Vec<RawCartEntry>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.entries.lock().unwrap().clone())
        }

        async fn upsert_quantity(
            &self,
            _token: &SecretString,
            product_id: &ProductId,
            qty: u32,
        ) -> Result<Vec<RawCartEntry>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.reject_with {
                return Err(ApiError::Rejected {
                    status: 404,
                    message: message.clone(),
                });
            }

            let mut entries = self.entries.lock().unwrap();
            match entries.iter_mut().find(|e| &e.product_id == product_id) {
                Some(entry) => entry.qty = qty,
                None => entries.push(RawCartEntry::new(product_id.clone(), qty)),
            }
            Ok(entries.clone())
        }
    }

    fn token() -> SecretString {
        SecretString::from("testtoken")
    }

    fn product(id: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            category: "Sports".to_string(),
            cost: Price::from(100),
            rating: 5,
            image_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_add_makes_no_request() {
        let api = FakeCartApi::default();
        let service = CartService::new(api.clone());
        let catalog = product_list(vec![product("p1")]);
        let current = reconcile(&[RawCartEntry::new("p1", 1)], &catalog);

        let token = token();
        let result = service
            .add_to_cart(Some(&token), &current, &ProductId::new("p1"))
            .await;

        assert!(matches!(result, Err(CartError::Duplicate(id)) if id == "p1"));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_add_without_token_makes_no_request() {
        let api = FakeCartApi::default();
        let service = CartService::new(api.clone());

        let result = service.add_to_cart(None, &[], &ProductId::new("p1")).await;
        assert!(matches!(result, Err(CartError::LoginRequired)));

        let empty = SecretString::from("");
        let result = service
            .upsert_quantity(Some(&empty), &ProductId::new("p1"), 3)
            .await;
        assert!(matches!(result, Err(CartError::LoginRequired)));

        assert!(matches!(service.fetch(None).await, Err(CartError::LoginRequired)));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_add_new_product_sends_quantity_one() {
        let api = FakeCartApi::default();
        let service = CartService::new(api.clone());

        let token = token();
        let entries = service
            .add_to_cart(Some(&token), &[], &ProductId::new("p2"))
            .await
            .unwrap();

        assert_eq!(entries, vec![RawCartEntry::new("p2", 1)]);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_quantity_is_passed_through() {
        let api = FakeCartApi::default();
        api.entries.lock().unwrap().push(RawCartEntry::new("p1", 4));
        let service = CartService::new(api.clone());

        let token = token();
        let entries = service
            .upsert_quantity(Some(&token), &ProductId::new("p1"), 0)
            .await
            .unwrap();

        assert_eq!(entries, vec![RawCartEntry::new("p1", 0)]);
    }

    #[tokio::test]
    async fn test_rejection_is_surfaced() {
        let api = FakeCartApi {
            reject_with: Some("Product doesn't exist".to_string()),
            ..FakeCartApi::default()
        };
        let service = CartService::new(api);

        let token = token();
        let result = service
            .upsert_quantity(Some(&token), &ProductId::new("nope"), 1)
            .await;

        let Err(CartError::Api(err)) = result else {
            panic!("expected api error");
        };
        assert_eq!(err.rejection_message(), Some("Product doesn't exist"));
    }
}
