//! The storefront: every client operation behind one cloneable handle.

use std::sync::Arc;

use qkart_core::{ProductId, ProductList, RawCartEntry, Username};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::api::{LoginResponse, QKartClient};
use crate::cart::{CartService, CartState, CartSummary, Ticket, reconcile};
use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::error::{self, Result, StorefrontError};
use crate::search::{SearchDebouncer, SearchOutcome, SearchState};
use crate::session::{FileStore, KeyValueStore, Session, SessionStore};

/// Storefront client state shared across tasks.
///
/// Cheaply cloneable via `Arc`. Cart lines are reconciled against the
/// catalog as last loaded by [`Storefront::load_catalog`]; until it has
/// been loaded, carts reconcile to no lines.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    client: QKartClient,
    session: SessionStore,
    catalog: Catalog,
    cart: CartState,
    cart_service: CartService<QKartClient>,
    search: SearchDebouncer<QKartClient>,
}

impl Storefront {
    /// Create a storefront persisting its session to `config.session_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self> {
        let store = FileStore::new(config.session_path.clone());
        Self::with_store(config, store)
    }

    /// Create a storefront persisting its session to `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_store(config: StorefrontConfig, store: impl KeyValueStore + 'static) -> Result<Self> {
        let client = QKartClient::new(&config.api).map_err(StorefrontError::Client)?;

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                session: SessionStore::new(store),
                catalog: Catalog::new(),
                cart: CartState::new(),
                cart_service: CartService::new(client.clone()),
                search: SearchDebouncer::new(client.clone()),
                client,
                config,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn client(&self) -> &QKartClient {
        &self.inner.client
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in and persist the session.
    ///
    /// The username is validated before the password, and neither failure
    /// sends a request.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `LoginRejected` with the backend's
    /// message, or an error if the request or session write fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Session> {
        let username = Username::parse(username)?;
        if password.expose_secret().is_empty() {
            return Err(StorefrontError::MissingPassword);
        }

        let response = self
            .inner
            .client
            .login(&username, password)
            .await
            .map_err(StorefrontError::Login)?;

        match response {
            LoginResponse::Authenticated(auth) => {
                let session = self.inner.session.persist(&auth)?;
                self.inner.cart.clear();
                error::set_sentry_user(&auth.username);
                info!(username = %auth.username, "Logged in");
                Ok(session)
            }
            LoginResponse::Rejected { message } => {
                info!(%message, "Login rejected");
                Err(StorefrontError::LoginRejected(message))
            }
        }
    }

    /// Log out: remove the session keys and empty the cart.
    ///
    /// A corrupt session file is replaced rather than reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<()> {
        self.inner.session.clear()?;
        self.inner.cart.clear();
        error::clear_sentry_user();
        info!("Logged out");
        Ok(())
    }

    /// The persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub fn session(&self) -> Result<Session> {
        Ok(self.inner.session.load()?)
    }

    async fn current_session(&self) -> Result<Session> {
        Ok(self.inner.session.load_async().await?)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Load the product list and make it the catalog carts reconcile against.
    ///
    /// # Errors
    ///
    /// Returns `Catalog` if the product list cannot be fetched.
    #[instrument(skip(self))]
    pub async fn load_catalog(&self) -> Result<ProductList> {
        let products = self
            .inner
            .client
            .products()
            .await
            .map_err(StorefrontError::Catalog)?;

        self.inner.catalog.replace(products.clone());
        info!(count = products.len(), "Catalog loaded");
        Ok(products)
    }

    /// The catalog as last loaded.
    #[must_use]
    pub fn catalog(&self) -> ProductList {
        self.inner.catalog.snapshot()
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the cart from the backend.
    ///
    /// Without a session the cart is emptied and no request is sent.
    ///
    /// # Errors
    ///
    /// Returns `CartFetch` if the request fails.
    #[instrument(skip(self))]
    pub async fn refresh_cart(&self) -> Result<CartSummary> {
        let session = self.current_session().await?;
        let Some(token) = session.token() else {
            debug!("No session, cart left empty");
            self.inner.cart.clear();
            return Ok(CartSummary::default());
        };

        let ticket = self.inner.cart.ticket();
        let entries = self
            .inner
            .cart_service
            .fetch(Some(token))
            .await
            .map_err(StorefrontError::cart_fetch)?;

        Ok(self.apply(ticket, &entries))
    }

    /// Add one unit of a product that is not in the cart yet.
    ///
    /// The duplicate check runs against the backend's cart: if none has
    /// been fetched since the last login or logout, it is fetched first.
    ///
    /// # Errors
    ///
    /// Returns `LoginRequired` or `DuplicateItem` without sending a
    /// request, or `CartUpdate` if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&self, product_id: &ProductId) -> Result<CartSummary> {
        let session = self.current_session().await?;
        if session.is_logged_in() && !self.inner.cart.is_synced() {
            debug!("Cart not fetched yet, fetching before the duplicate check");
            self.refresh_cart().await?;
        }
        let current = self.inner.cart.items();

        let ticket = self.inner.cart.ticket();
        let entries = self
            .inner
            .cart_service
            .add_to_cart(session.token(), &current, product_id)
            .await
            .map_err(StorefrontError::cart_update)?;

        error::add_breadcrumb("cart", "Added to cart", &[("product_id", product_id.as_str())]);
        Ok(self.apply(ticket, &entries))
    }

    /// Set the quantity of a product in the cart. `qty = 0` is sent as is.
    ///
    /// # Errors
    ///
    /// Returns `LoginRequired` without sending a request, or `CartUpdate`
    /// if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn set_quantity(&self, product_id: &ProductId, qty: u32) -> Result<CartSummary> {
        let session = self.current_session().await?;

        let ticket = self.inner.cart.ticket();
        let entries = self
            .inner
            .cart_service
            .upsert_quantity(session.token(), product_id, qty)
            .await
            .map_err(StorefrontError::cart_update)?;

        let qty = qty.to_string();
        error::add_breadcrumb(
            "cart",
            "Quantity set",
            &[("product_id", product_id.as_str()), ("qty", &qty)],
        );
        Ok(self.apply(ticket, &entries))
    }

    /// The cart as last applied.
    #[must_use]
    pub fn cart(&self) -> CartSummary {
        self.inner.cart.summary()
    }

    /// Reconcile a backend response and apply it unless a later request
    /// has already been applied. Returns the current cart either way.
    fn apply(&self, ticket: Ticket, entries: &[RawCartEntry]) -> CartSummary {
        let catalog = self.inner.catalog.snapshot();
        if catalog.is_empty() && !entries.is_empty() {
            debug!(entries = entries.len(), "Catalog not loaded, cart has no lines yet");
        }
        let items = reconcile(entries, &catalog);

        if !self.inner.cart.apply(ticket, items) {
            debug!("Cart response superseded by a later request");
        }
        self.inner.cart.summary()
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Search right away, bypassing the debounce delay.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> SearchOutcome {
        SearchOutcome::from_result(self.inner.client.search(query).await)
    }

    /// Search once the configured debounce delay passes with no newer query.
    ///
    /// Results are published to [`Storefront::search_results`].
    pub fn schedule_search(&self, query: impl Into<String>) {
        self.inner
            .search
            .schedule(query, self.inner.config.search_debounce);
    }

    /// Subscribe to debounced search progress.
    #[must_use]
    pub fn search_results(&self) -> watch::Receiver<SearchState> {
        self.inner.search.subscribe()
    }
}
