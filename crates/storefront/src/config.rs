//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `QKART_API_ENDPOINT` - Backend base URL (default: `http://localhost:8082/api/v1`)
//! - `QKART_SESSION_PATH` - Session file (default: `$HOME/.qkart/session.json`)
//! - `QKART_SEARCH_DEBOUNCE_MS` - Search debounce delay in ms (default: 500)
//! - `QKART_HTTP_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `QKART_CATALOG_CACHE_TTL_SECS` - Product list cache TTL (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_ENDPOINT: &str = "http://localhost:8082/api/v1";
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;
const SESSION_FILE: &str = ".qkart/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// File holding the persisted session
    pub session_path: PathBuf,
    /// Idle time before a typed search is executed
    pub search_debounce: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto
    pub endpoint: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long the full product list is cached
    pub catalog_cache_ttl: Duration,
}

impl ApiConfig {
    /// Configuration pointing at `endpoint` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `endpoint` is not an http(s) URL.
    pub fn new(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: parse_endpoint("QKART_API_ENDPOINT", endpoint)?,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if no
    /// session path is given and `HOME` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup("QKART_API_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());
        let endpoint = parse_endpoint("QKART_API_ENDPOINT", &endpoint)?;

        let timeout_secs: u64 = parse_or_default(
            &lookup,
            "QKART_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;
        let cache_ttl_secs: u64 = parse_or_default(
            &lookup,
            "QKART_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CATALOG_CACHE_TTL_SECS,
        )?;

        let debounce_ms: u64 = parse_or_default(
            &lookup,
            "QKART_SEARCH_DEBOUNCE_MS",
            DEFAULT_SEARCH_DEBOUNCE_MS,
        )?;
        if debounce_ms == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "QKART_SEARCH_DEBOUNCE_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let session_path = match lookup("QKART_SESSION_PATH") {
            Some(path) => PathBuf::from(path),
            None => lookup("HOME")
                .map(|home| PathBuf::from(home).join(SESSION_FILE))
                .ok_or_else(|| ConfigError::MissingEnvVar("QKART_SESSION_PATH".to_string()))?,
        };

        Ok(Self {
            api: ApiConfig {
                endpoint,
                timeout: Duration::from_secs(timeout_secs),
                catalog_cache_ttl: Duration::from_secs(cache_ttl_secs),
            },
            session_path,
            search_debounce: Duration::from_millis(debounce_ms),
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, falling back to `default` when absent.
fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse the API endpoint, normalizing it to end with a slash so that
/// `Url::join` appends paths instead of replacing the last segment.
fn parse_endpoint(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[("HOME", "/home/shopper")])).unwrap();

        assert_eq!(config.api.endpoint.as_str(), "http://localhost:8082/api/v1/");
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.api.catalog_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.search_debounce, Duration::from_millis(500));
        assert_eq!(
            config.session_path,
            PathBuf::from("/home/shopper/.qkart/session.json")
        );
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[
            ("QKART_API_ENDPOINT", "https://qkart.example.com/api/v1/"),
            ("QKART_SESSION_PATH", "/tmp/session.json"),
            ("QKART_SEARCH_DEBOUNCE_MS", "250"),
            ("QKART_HTTP_TIMEOUT_SECS", "3"),
            ("SENTRY_DSN", ""),
        ]))
        .unwrap();

        assert_eq!(
            config.api.endpoint.as_str(),
            "https://qkart.example.com/api/v1/"
        );
        assert_eq!(config.session_path, PathBuf::from("/tmp/session.json"));
        assert_eq!(config.search_debounce, Duration::from_millis(250));
        assert_eq!(config.api.timeout, Duration::from_secs(3));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_endpoint_gets_trailing_slash() {
        let url = parse_endpoint("KEY", "http://10.0.0.5:8082/api/v1").unwrap();
        assert_eq!(url.join("products").unwrap().path(), "/api/v1/products");
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let result = parse_endpoint("KEY", "ftp://example.com/");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_rejects_zero_debounce() {
        let result = StorefrontConfig::from_lookup(lookup_from(&[
            ("HOME", "/home/shopper"),
            ("QKART_SEARCH_DEBOUNCE_MS", "0"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "QKART_SEARCH_DEBOUNCE_MS"));
    }

    #[test]
    fn test_rejects_unparseable_number() {
        let result = StorefrontConfig::from_lookup(lookup_from(&[
            ("HOME", "/home/shopper"),
            ("QKART_HTTP_TIMEOUT_SECS", "ten"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_missing_home_and_session_path() {
        let result = StorefrontConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }
}
