//! Storefront backend client implementation.
//!
//! Uses `reqwest` for HTTP and caches the full product list using `moka`.

use std::sync::Arc;

use moka::future::Cache;
use qkart_core::{Product, ProductId, ProductList, RawCartEntry, Username, product_list};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ApiConfig;

use super::types::{CartUpdateRequest, ErrorBody, LoginBody, LoginRequest, LoginResponse};
use super::ApiError;

const PRODUCTS_CACHE_KEY: &str = "products";

// =============================================================================
// QKartClient
// =============================================================================

/// Client for the storefront backend.
///
/// Cheap to clone; clones share the connection pool and product cache.
#[derive(Clone)]
pub struct QKartClient {
    inner: Arc<QKartClientInner>,
}

struct QKartClientInner {
    client: reqwest::Client,
    endpoint: Url,
    cache: Cache<&'static str, ProductList>,
}

impl QKartClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(QKartClientInner {
                client,
                endpoint: config.endpoint.clone(),
                cache,
            }),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.endpoint.join(path)?)
    }

    /// Send a request and decode a JSON success body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_from_body(status, body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Log in with a username and password.
    ///
    /// A refusal that the backend explains (`{success:false, message}`) is an
    /// `Ok(LoginResponse::Rejected)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or answers with
    /// something other than a login body.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(
        &self,
        username: &Username,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let request = self.inner.client.post(self.url("auth/login")?).json(&LoginRequest {
            username: username.as_str(),
            password: password.expose_secret(),
        });

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<LoginBody>(&body) {
            Ok(login) => {
                let outcome = LoginResponse::try_from(login)?;
                debug!(
                    status = status.as_u16(),
                    accepted = matches!(outcome, LoginResponse::Authenticated(_)),
                    "Login answered"
                );
                Ok(outcome)
            }
            Err(e) if status.is_success() => Err(ApiError::Parse(e)),
            Err(_) => Err(error_from_body(status, body)),
        }
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get the full product list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<ProductList, ApiError> {
        if let Some(products) = self.inner.cache.get(PRODUCTS_CACHE_KEY).await {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .execute(self.inner.client.get(self.url("products")?))
            .await?;
        let products = product_list(products);

        debug!(count = products.len(), "Fetched product list");
        self.inner
            .cache
            .insert(PRODUCTS_CACHE_KEY, products.clone())
            .await;

        Ok(products)
    }

    /// Search products by name or category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails. The backend answers a
    /// search with no matches with an error status, so this also errors
    /// when nothing matched.
    #[instrument(skip(self))]
    pub async fn search(&self, text: &str) -> Result<Vec<Product>, ApiError> {
        let mut url = self.url("products/search")?;
        url.query_pairs_mut().append_pair("value", text);

        let products: Vec<Product> = self.execute(self.inner.client.get(url)).await?;
        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Drop the cached product list so the next call refetches it.
    pub async fn invalidate_products(&self) {
        self.inner.cache.invalidate(PRODUCTS_CACHE_KEY).await;
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get the entries of the logged-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_cart(&self, token: &SecretString) -> Result<Vec<RawCartEntry>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url("cart")?)
            .bearer_auth(token.expose_secret());

        let entries: Vec<RawCartEntry> = self.execute(request).await?;
        debug!(entries = entries.len(), "Fetched cart");
        Ok(entries)
    }

    /// Set the quantity of one product in the cart.
    ///
    /// Returns the full updated cart. Whether `qty = 0` removes the line is
    /// up to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn post_cart(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        qty: u32,
    ) -> Result<Vec<RawCartEntry>, ApiError> {
        let request = self
            .inner
            .client
            .post(self.url("cart")?)
            .bearer_auth(token.expose_secret())
            .json(&CartUpdateRequest { product_id, qty });

        let entries: Vec<RawCartEntry> = self.execute(request).await?;
        debug!(entries = entries.len(), "Cart updated");
        Ok(entries)
    }
}

/// Classify a non-success response by whether it carries a message.
fn error_from_body(status: reqwest::StatusCode, body: String) -> ApiError {
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(error) => {
            tracing::warn!(
                status = status.as_u16(),
                message = %error.message,
                "Backend rejected request"
            );
            ApiError::Rejected {
                status: status.as_u16(),
                message: error.message,
            }
        }
        Err(_) => {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            ApiError::Status {
                status: status.as_u16(),
                body,
            }
        }
    }
}
