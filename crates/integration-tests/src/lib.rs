//! Integration tests for the QKart storefront client.
//!
//! Tests drive a [`Storefront`](qkart_storefront::Storefront) against
//! [`FakeBackend`], an in-process axum server speaking the QKart REST API
//! on an ephemeral port. No external services are needed:
//!
//! ```bash
//! cargo test -p qkart-integration-tests
//! ```
//!
//! The backend records every request it serves so tests can assert that
//! guarded operations never reached the network.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use qkart_storefront::Storefront;
use qkart_storefront::config::StorefrontConfig;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Username of the seeded account.
pub const USERNAME: &str = "crio.do";

/// Password of the seeded account.
pub const PASSWORD: &str = "learnbydoing";

/// Wallet balance of the seeded account.
pub const BALANCE: u32 = 5000;

/// Basketball, $48.
pub const BASKETBALL: &str = "BW0jAAeDJmlZCF8i";

/// Atomic Habits, $20.
pub const BOOK: &str = "KCRwjF7lN97HnEaY";

/// Duffle bag, $150.
pub const DUFFLE: &str = "upLK9JbQ4rMhTwt4";

/// Floor lamp, $79.
pub const LAMP: &str = "v4sLtEcMpzabRyfx";

/// The backend's product list in wire format.
#[must_use]
pub fn products() -> Vec<Value> {
    vec![
        product(BASKETBALL, "Basketball", "Sports", 48, 5),
        product(BOOK, "Atomic Habits", "Books", 20, 4),
        product(DUFFLE, "Tan Leatherette Weekender Duffle", "Fashion", 150, 4),
        product(LAMP, "Yarine Floor Lamp", "Home & Kitchen", 79, 5),
    ]
}

fn product(id: &str, name: &str, category: &str, cost: u32, rating: u8) -> Value {
    json!({
        "_id": id,
        "name": name,
        "category": category,
        "cost": cost,
        "rating": rating,
        "image": format!("https://images.qkart.test/{id}.png"),
    })
}

/// Storefront configuration pointing at `endpoint` with a short search
/// debounce and a session file at `session_path`.
///
/// # Panics
///
/// Panics if `endpoint` is not a valid URL.
#[must_use]
#[allow(clippy::expect_used)]
pub fn config(endpoint: &str, session_path: &Path) -> StorefrontConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("QKART_API_ENDPOINT", endpoint.to_string()),
        ("QKART_SESSION_PATH", session_path.display().to_string()),
        ("QKART_SEARCH_DEBOUNCE_MS", "50".to_string()),
        ("QKART_HTTP_TIMEOUT_SECS", "5".to_string()),
    ]);
    StorefrontConfig::from_lookup(|key| vars.get(key).cloned()).expect("valid test configuration")
}

/// A private directory holding one test's session file. The directory and
/// the saved token are deleted when this is dropped.
pub struct SessionDir {
    dir: TempDir,
}

impl SessionDir {
    /// Create an empty session directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("session tempdir"),
        }
    }

    /// Path of the session file inside the directory.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("session.json")
    }

    /// A storefront for `backend` saving its session here.
    ///
    /// # Panics
    ///
    /// Panics if the storefront cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn storefront(&self, backend: &FakeBackend) -> Storefront {
        Storefront::new(config(backend.endpoint(), &self.path())).expect("storefront")
    }
}

impl Default for SessionDir {
    fn default() -> Self {
        Self::new()
    }
}

/// A storefront logged in as the seeded account with its catalog loaded,
/// and the directory holding its session. Keep the directory alive for as
/// long as the storefront is used.
///
/// # Panics
///
/// Panics if login or the catalog load fails.
#[allow(clippy::expect_used)]
pub async fn shopper(backend: &FakeBackend) -> (Storefront, SessionDir) {
    let session = SessionDir::new();
    let storefront = session.storefront(backend);
    storefront
        .login(USERNAME, &SecretString::from(PASSWORD))
        .await
        .expect("login");
    storefront.load_catalog().await.expect("catalog");
    (storefront, session)
}

// =============================================================================
// Fake backend
// =============================================================================

/// In-process QKart backend.
///
/// Serves `POST /auth/login`, `GET /products`, `GET /products/search` and
/// `GET|POST /cart` under `/api/v1`. Stops when dropped.
pub struct FakeBackend {
    endpoint: String,
    backend: Backend,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Start serving on an ephemeral localhost port.
    ///
    /// # Panics
    ///
    /// Panics if the port cannot be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let backend = Backend::default();

        let app = Router::new()
            .route("/api/v1/auth/login", post(login))
            .route("/api/v1/products", get(list_products))
            .route("/api/v1/products/search", get(search_products))
            .route("/api/v1/cart", get(get_cart).post(update_cart))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            endpoint: format!("http://{addr}/api/v1"),
            backend,
            server,
        }
    }

    /// Base URL to configure the client with.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Every request served so far, as `"METHOD /path"` lines.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.backend.inner.requests).clone()
    }

    /// Number of served requests whose line starts with `prefix`.
    #[must_use]
    pub fn request_count(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    /// Make every endpoint answer 500 with an HTML body.
    pub fn set_broken(&self, broken: bool) {
        self.backend.inner.broken.store(broken, Ordering::SeqCst);
    }

    /// Hold cart updates for `product_id` for `delay` before applying them.
    pub fn delay_cart_updates(&self, product_id: &str, delay: Duration) {
        lock(&self.backend.inner.slow_products).insert(product_id.to_string(), delay);
    }

    /// Replace a user's cart, bypassing product checks.
    pub fn seed_cart(&self, username: &str, entries: &[(&str, u32)]) {
        let rows = entries
            .iter()
            .map(|(id, qty)| ((*id).to_string(), *qty))
            .collect();
        lock(&self.backend.inner.carts).insert(username.to_string(), rows);
    }

    /// A user's cart as stored by the backend.
    #[must_use]
    pub fn cart_of(&self, username: &str) -> Vec<(String, u32)> {
        lock(&self.backend.inner.carts)
            .get(username)
            .cloned()
            .unwrap_or_default()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

#[derive(Clone, Default)]
struct Backend {
    inner: Arc<BackendInner>,
}

#[derive(Default)]
struct BackendInner {
    carts: Mutex<HashMap<String, Vec<(String, u32)>>>,
    requests: Mutex<Vec<String>>,
    slow_products: Mutex<HashMap<String, Duration>>,
    broken: AtomicBool,
}

impl Backend {
    fn record(&self, line: String) {
        lock(&self.inner.requests).push(line);
    }

    fn is_broken(&self) -> bool {
        self.inner.broken.load(Ordering::SeqCst)
    }

    fn user_for(headers: &HeaderMap) -> Option<&'static str> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        (token == token_for(USERNAME)).then_some(USERNAME)
    }

    fn cart_json(&self, username: &str) -> Value {
        let carts = lock(&self.inner.carts);
        let rows = carts.get(username).map_or(&[][..], Vec::as_slice);
        Value::Array(
            rows.iter()
                .map(|(id, qty)| json!({ "productId": id, "qty": qty }))
                .collect(),
        )
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn token_for(username: &str) -> String {
    format!("token-{username}")
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body>Internal Server Error</body></html>",
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(backend): State<Backend>, Json(body): Json<LoginBody>) -> Response {
    backend.record("POST /auth/login".to_string());
    if backend.is_broken() {
        return server_error();
    }

    if body.username != USERNAME {
        return failure(StatusCode::BAD_REQUEST, "Username does not exist");
    }
    if body.password != PASSWORD {
        return failure(StatusCode::BAD_REQUEST, "Password is incorrect");
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "token": token_for(USERNAME),
            "username": USERNAME,
            "balance": BALANCE,
        })),
    )
        .into_response()
}

async fn list_products(State(backend): State<Backend>) -> Response {
    backend.record("GET /products".to_string());
    if backend.is_broken() {
        return server_error();
    }
    Json(products()).into_response()
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    value: String,
}

async fn search_products(
    State(backend): State<Backend>,
    Query(params): Query<SearchParams>,
) -> Response {
    backend.record(format!("GET /products/search {}", params.value));
    if backend.is_broken() {
        return server_error();
    }

    let needle = params.value.to_lowercase();
    let matches: Vec<Value> = products()
        .into_iter()
        .filter(|p| {
            ["name", "category"].iter().any(|field| {
                p.get(*field)
                    .and_then(Value::as_str)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        })
        .collect();

    if matches.is_empty() {
        return failure(StatusCode::NOT_FOUND, "No products found");
    }
    Json(matches).into_response()
}

async fn get_cart(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.record("GET /cart".to_string());
    if backend.is_broken() {
        return server_error();
    }

    let Some(username) = Backend::user_for(&headers) else {
        return failure(
            StatusCode::UNAUTHORIZED,
            "Protected route, Oauth2 Bearer token not found",
        );
    };
    Json(backend.cart_json(username)).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartBody {
    product_id: String,
    qty: u32,
}

async fn update_cart(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<CartBody>,
) -> Response {
    backend.record(format!("POST /cart {} {}", body.product_id, body.qty));
    if backend.is_broken() {
        return server_error();
    }

    let Some(username) = Backend::user_for(&headers) else {
        return failure(
            StatusCode::UNAUTHORIZED,
            "Protected route, Oauth2 Bearer token not found",
        );
    };

    let known = products()
        .iter()
        .any(|p| p.get("_id").and_then(Value::as_str) == Some(body.product_id.as_str()));
    if !known {
        return failure(StatusCode::NOT_FOUND, "Product doesn't exist");
    }

    let delay = lock(&backend.inner.slow_products)
        .get(&body.product_id)
        .copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    {
        let mut carts = lock(&backend.inner.carts);
        let rows = carts.entry(username.to_string()).or_default();
        match rows.iter().position(|(id, _)| *id == body.product_id) {
            Some(i) if body.qty == 0 => {
                rows.remove(i);
            }
            Some(i) => {
                if let Some(row) = rows.get_mut(i) {
                    row.1 = body.qty;
                }
            }
            None if body.qty == 0 => {}
            None => rows.push((body.product_id, body.qty)),
        }
    }

    Json(backend.cart_json(username)).into_response()
}
