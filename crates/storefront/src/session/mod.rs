//! Logged-in session state.
//!
//! The session is three string keys in a persistent store. It is only read
//! and written through [`SessionStore`]; other components receive a
//! [`Session`] value instead of reaching into storage themselves.

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

use std::sync::Arc;

use qkart_core::Price;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::Authenticated;

/// Session keys in the persistent store.
pub mod keys {
    /// Key for the bearer token.
    pub const TOKEN: &str = "token";

    /// Key for the logged-in username.
    pub const USERNAME: &str = "username";

    /// Key for the wallet balance.
    pub const BALANCE: &str = "balance";

    /// Every session key; cleared together on logout.
    pub const ALL: [&str; 3] = [TOKEN, USERNAME, BALANCE];
}

/// Errors reading or writing the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Storage could not be read or written.
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data is not valid JSON.
    #[error("session storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Snapshot of the persisted session.
///
/// A session with a token is logged in; the other fields are for display.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Bearer token, present while logged in.
    pub token: Option<SecretString>,
    /// Logged-in username.
    pub username: Option<String>,
    /// Wallet balance at login time.
    pub balance: Option<Price>,
}

impl Session {
    /// Whether a non-empty token is present.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    /// The bearer token, if present and non-empty.
    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.token
            .as_ref()
            .filter(|token| !token.expose_secret().is_empty())
    }
}

impl From<&Authenticated> for Session {
    fn from(auth: &Authenticated) -> Self {
        Self {
            token: Some(auth.token.clone()),
            username: Some(auth.username.clone()),
            balance: Some(auth.balance),
        }
    }
}

/// Reads and writes the session through a [`KeyValueStore`].
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Create a session store over `backend`.
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Load the current session. Missing keys yield `None` fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    pub fn load(&self) -> Result<Session, SessionError> {
        let token = self.backend.get(keys::TOKEN)?.map(SecretString::from);
        let username = self.backend.get(keys::USERNAME)?;
        let balance = self
            .backend
            .get(keys::BALANCE)?
            .and_then(|raw| match raw.parse::<Price>() {
                Ok(balance) => Some(balance),
                Err(e) => {
                    warn!(error = %e, "Ignoring unparseable stored balance");
                    None
                }
            });

        Ok(Session {
            token,
            username,
            balance,
        })
    }

    /// Load the current session on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    pub async fn load_async(&self) -> Result<Session, SessionError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| SessionError::Io(std::io::Error::other(e)))?
    }

    /// Persist the credentials of a successful login.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    pub fn persist(&self, auth: &Authenticated) -> Result<Session, SessionError> {
        self.backend.set_all(&[
            (keys::TOKEN, auth.token.expose_secret().to_string()),
            (keys::USERNAME, auth.username.clone()),
            (keys::BALANCE, auth.balance.amount().to_string()),
        ])?;

        info!(username = %auth.username, "Session persisted");
        Ok(Session::from(auth))
    }

    /// Remove every session key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.backend.remove_all(&keys::ALL)?;
        info!("Session cleared");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn authenticated() -> Authenticated {
        Authenticated {
            token: SecretString::from("testtoken"),
            username: "criodo".to_string(),
            balance: Price::from(5000),
        }
    }

    #[test]
    fn test_empty_store_is_logged_out() {
        let store = SessionStore::new(MemoryStore::new());
        let session = store.load().unwrap();

        assert!(!session.is_logged_in());
        assert!(session.username.is_none());
        assert!(session.balance.is_none());
    }

    #[tokio::test]
    async fn test_load_async_matches_load() {
        let store = SessionStore::new(MemoryStore::new());
        store.persist(&authenticated()).unwrap();

        let session = store.load_async().await.unwrap();
        assert_eq!(session.username.as_deref(), Some("criodo"));
        assert!(session.is_logged_in());
    }

    #[test]
    fn test_persist_then_load() {
        let store = SessionStore::new(MemoryStore::new());
        store.persist(&authenticated()).unwrap();

        let session = store.load().unwrap();
        assert!(session.is_logged_in());
        assert_eq!(session.token().unwrap().expose_secret(), "testtoken");
        assert_eq!(session.username.as_deref(), Some("criodo"));
        assert_eq!(session.balance, Some(Price::from(5000)));
    }

    #[test]
    fn test_clear_removes_all_keys() {
        let backend = Arc::new(MemoryStore::new());
        let store = SessionStore {
            backend: backend.clone(),
        };
        store.persist(&authenticated()).unwrap();
        store.clear().unwrap();

        for key in keys::ALL {
            assert_eq!(backend.get(key).unwrap(), None, "{key} should be cleared");
        }
        assert!(!store.load().unwrap().is_logged_in());
    }

    #[test]
    fn test_empty_token_is_logged_out() {
        let session = Session {
            token: Some(SecretString::from("")),
            username: Some("criodo".to_string()),
            balance: None,
        };
        assert!(!session.is_logged_in());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_bad_balance_is_ignored() {
        let backend = MemoryStore::new();
        backend
            .set_all(&[(keys::TOKEN, "t".to_string()), (keys::BALANCE, "lots".to_string())])
            .unwrap();
        let session = SessionStore::new(backend).load().unwrap();

        assert!(session.is_logged_in());
        assert!(session.balance.is_none());
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::from(&authenticated());
        let debug_output = format!("{session:?}");
        assert!(!debug_output.contains("testtoken"));
        assert!(debug_output.contains("criodo"));
    }
}
