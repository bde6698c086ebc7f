//! Catalog loading and product search against the fake backend.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use qkart_integration_tests::{BASKETBALL, FakeBackend, SessionDir};
use qkart_storefront::search::{NotFoundReason, SearchOutcome, SearchState};

#[tokio::test]
async fn test_catalog_loads_in_backend_order() {
    let backend = FakeBackend::start().await;
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);

    let products = storefront.load_catalog().await.unwrap();

    assert_eq!(products.len(), 4);
    assert_eq!(products.first().map(|p| p.id.as_str()), Some(BASKETBALL));
    assert_eq!(storefront.catalog().len(), 4);
}

#[tokio::test]
async fn test_catalog_fetch_is_cached() {
    let backend = FakeBackend::start().await;
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);

    storefront.load_catalog().await.unwrap();
    storefront.load_catalog().await.unwrap();

    assert_eq!(backend.request_count("GET /products"), 1);

    storefront.client().invalidate_products().await;
    storefront.load_catalog().await.unwrap();
    assert_eq!(backend.request_count("GET /products"), 2);
}

#[tokio::test]
async fn test_catalog_failure_gets_generic_message() {
    let backend = FakeBackend::start().await;
    backend.set_broken(true);
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);

    let err = storefront.load_catalog().await.unwrap_err();

    assert_eq!(
        err.notice().message,
        "Something went wrong. Check that the backend is running, reachable and returns valid JSON."
    );
    assert!(storefront.catalog().is_empty());
}

#[tokio::test]
async fn test_search_matches_name_and_category() {
    let backend = FakeBackend::start().await;
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);

    let by_name = storefront.search("basket").await;
    assert_eq!(by_name.products().len(), 1);

    let by_category = storefront.search("home & kitchen").await;
    assert_eq!(by_category.products().first().map(|p| p.name.as_str()), Some("Yarine Floor Lamp"));

    // Query text is URL-encoded on the way out.
    assert!(backend.requests().contains(&"GET /products/search home & kitchen".to_string()));
}

#[tokio::test]
async fn test_search_without_matches_is_not_found() {
    let backend = FakeBackend::start().await;
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);

    let outcome = storefront.search("spaceship").await;

    assert!(outcome.is_not_found());
    assert!(matches!(
        outcome,
        SearchOutcome::NotFound(NotFoundReason::Failed(ref m)) if m.contains("No products found")
    ));
}

#[tokio::test]
async fn test_search_on_broken_backend_is_not_found() {
    let backend = FakeBackend::start().await;
    backend.set_broken(true);
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);

    assert!(storefront.search("ball").await.is_not_found());
}

#[tokio::test]
async fn test_debounced_typing_sends_one_search() {
    let backend = FakeBackend::start().await;
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);
    let mut results = storefront.search_results();

    for query in ["b", "ba", "bas", "basketball"] {
        storefront.schedule_search(query);
    }

    let state = tokio::time::timeout(
        Duration::from_secs(5),
        results.wait_for(|s| matches!(s, SearchState::Done { .. })),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    let SearchState::Done { query, outcome } = state else {
        panic!("search did not finish");
    };
    assert_eq!(query, "basketball");
    assert_eq!(outcome.products().len(), 1);
    assert_eq!(
        backend.requests(),
        vec!["GET /products/search basketball".to_string()]
    );
}
