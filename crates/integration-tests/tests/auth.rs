//! Login, logout and session persistence against the fake backend.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use qkart_core::Price;
use qkart_integration_tests::{BALANCE, FakeBackend, PASSWORD, SessionDir, USERNAME};
use qkart_storefront::{Severity, StorefrontError};
use secrecy::SecretString;

fn password(s: &str) -> SecretString {
    SecretString::from(s)
}

#[tokio::test]
async fn test_login_persists_session() {
    let backend = FakeBackend::start().await;
    let session_dir = SessionDir::new();
    let storefront = session_dir.storefront(&backend);

    let session = storefront.login(USERNAME, &password(PASSWORD)).await.unwrap();

    assert!(session.is_logged_in());
    assert_eq!(session.username.as_deref(), Some(USERNAME));
    assert_eq!(session.balance, Some(Price::from(BALANCE)));

    let stored: BTreeMap<String, String> =
        serde_json::from_str(&std::fs::read_to_string(session_dir.path()).unwrap()).unwrap();
    assert_eq!(stored.get("username").map(String::as_str), Some(USERNAME));
    assert_eq!(stored.get("balance").map(String::as_str), Some("5000"));
    assert!(stored.contains_key("token"));
}

#[tokio::test]
async fn test_session_survives_restart() {
    let backend = FakeBackend::start().await;
    let session = SessionDir::new();

    {
        let storefront = session.storefront(&backend);
        storefront.login(USERNAME, &password(PASSWORD)).await.unwrap();
    }

    let reopened = session.storefront(&backend);
    let session = reopened.session().unwrap();
    assert!(session.is_logged_in());
    assert_eq!(session.username.as_deref(), Some(USERNAME));

    // The saved token is accepted by the backend.
    reopened.refresh_cart().await.unwrap();
    assert_eq!(backend.request_count("GET /cart"), 1);
}

#[tokio::test]
async fn test_wrong_password_is_surfaced_verbatim() {
    let backend = FakeBackend::start().await;
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);

    let err = storefront
        .login(USERNAME, &password("letmein"))
        .await
        .unwrap_err();

    assert!(matches!(&err, StorefrontError::LoginRejected(m) if m == "Password is incorrect"));
    let notice = err.notice();
    assert_eq!(notice.severity, Severity::Error);
    assert_eq!(notice.message, "Password is incorrect");
    assert!(!storefront.session().unwrap().is_logged_in());
}

#[tokio::test]
async fn test_unknown_user_is_rejected() {
    let backend = FakeBackend::start().await;
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);

    let err = storefront
        .login("nobody", &password(PASSWORD))
        .await
        .unwrap_err();

    assert_eq!(err.notice().message, "Username does not exist");
}

#[tokio::test]
async fn test_validation_sends_no_request() {
    let backend = FakeBackend::start().await;
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);

    let err = storefront.login("", &password("")).await.unwrap_err();
    assert_eq!(err.notice().message, "Username is a required field");

    let err = storefront.login(USERNAME, &password("")).await.unwrap_err();
    assert_eq!(err.notice().message, "Password is a required field");

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_logout_clears_every_key() {
    let backend = FakeBackend::start().await;
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);

    storefront.login(USERNAME, &password(PASSWORD)).await.unwrap();
    storefront.logout().unwrap();

    let stored: BTreeMap<String, String> =
        serde_json::from_str(&std::fs::read_to_string(session.path()).unwrap()).unwrap();
    assert!(stored.is_empty());
    assert!(!storefront.session().unwrap().is_logged_in());

    let summary = storefront.refresh_cart().await.unwrap();
    assert!(summary.is_empty());
    assert_eq!(backend.request_count("GET /cart"), 0);
}

#[tokio::test]
async fn test_unreachable_backend_gets_generic_message() {
    let backend = FakeBackend::start().await;
    backend.set_broken(true);
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);

    let err = storefront
        .login(USERNAME, &password(PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, StorefrontError::Login(_)));
    assert_eq!(
        err.notice().message,
        "Something went wrong. Check that the backend is running, reachable and returns valid JSON."
    );
}

#[tokio::test]
async fn test_logout_recovers_from_corrupt_session_file() {
    let backend = FakeBackend::start().await;
    let session = SessionDir::new();
    let storefront = session.storefront(&backend);
    storefront.login(USERNAME, &password(PASSWORD)).await.unwrap();

    std::fs::write(session.path(), r#"{"token":"abc""#).unwrap();
    let err = storefront.refresh_cart().await.unwrap_err();
    assert!(matches!(err, StorefrontError::Session(_)));

    storefront.logout().unwrap();

    assert!(!storefront.session().unwrap().is_logged_in());
    assert!(storefront.refresh_cart().await.unwrap().is_empty());
    assert_eq!(backend.request_count("GET /cart"), 0);
}
