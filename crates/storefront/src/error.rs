//! Storefront errors and the notices shown for them.
//!
//! Every operation on [`crate::state::Storefront`] returns
//! `Result<T, StorefrontError>`. Front ends turn an error into a [`Notice`]
//! with [`StorefrontError::notice`] and call [`StorefrontError::report`] so
//! unexpected failures reach Sentry.

use std::fmt;

use qkart_core::{ProductId, UsernameError};
use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::session::SessionError;

/// User-visible messages.
pub mod messages {
    pub const LOGGED_IN: &str = "Logged in successfully";
    pub const LOGGED_OUT: &str = "Logged out";
    pub const PASSWORD_REQUIRED: &str = "Password is a required field";
    pub const LOGIN_REQUIRED: &str = "Login to add an item to the Cart";
    pub const DUPLICATE_ITEM: &str =
        "Item already in cart. Use the cart sidebar to update quantity or remove item.";
    pub const ITEM_ADDED: &str = "Item added to cart";
    pub const ADD_FAILED: &str = "Could not add product to cart";
    pub const CART_FETCH_FAILED: &str = "Could not fetch cart details. Check that the backend is running, reachable and returns valid JSON.";
    pub const BACKEND_UNAVAILABLE: &str =
        "Something went wrong. Check that the backend is running, reachable and returns valid JSON.";
    pub const SESSION_FAILED: &str = "Could not access the saved session";
}

/// Errors from storefront operations.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Username failed validation; nothing was sent.
    #[error(transparent)]
    InvalidUsername(#[from] UsernameError),

    /// Password was empty; nothing was sent.
    #[error("password is empty")]
    MissingPassword,

    /// Backend refused the credentials.
    #[error("login rejected: {0}")]
    LoginRejected(String),

    /// Login request failed.
    #[error("login failed: {0}")]
    Login(#[source] ApiError),

    /// Cart action needs a session; nothing was sent.
    #[error("login required")]
    LoginRequired,

    /// Product is already in the cart; nothing was sent.
    #[error("product {0} is already in the cart")]
    DuplicateItem(ProductId),

    /// Product list could not be loaded.
    #[error("catalog load failed: {0}")]
    Catalog(#[source] ApiError),

    /// Cart could not be fetched.
    #[error("cart fetch failed: {0}")]
    CartFetch(#[source] ApiError),

    /// Cart could not be updated.
    #[error("cart update failed: {0}")]
    CartUpdate(#[source] ApiError),

    /// Session store could not be read or written.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// HTTP client could not be built.
    #[error("client setup failed: {0}")]
    Client(#[source] ApiError),
}

impl StorefrontError {
    /// Map a cart error from a fetch.
    #[must_use]
    pub fn cart_fetch(err: CartError) -> Self {
        match err {
            CartError::LoginRequired => Self::LoginRequired,
            CartError::Duplicate(id) => Self::DuplicateItem(id),
            CartError::Api(e) => Self::CartFetch(e),
        }
    }

    /// Map a cart error from an add or quantity update.
    #[must_use]
    pub fn cart_update(err: CartError) -> Self {
        match err {
            CartError::LoginRequired => Self::LoginRequired,
            CartError::Duplicate(id) => Self::DuplicateItem(id),
            CartError::Api(e) => Self::CartUpdate(e),
        }
    }

    /// The notice to show the user for this error.
    ///
    /// Backend rejections carry their message through verbatim; any other
    /// backend failure gets a generic message for the operation.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::InvalidUsername(e) => Notice::warning(e.to_string()),
            Self::MissingPassword => Notice::warning(messages::PASSWORD_REQUIRED),
            Self::LoginRejected(message) => Notice::error(message.clone()),
            Self::Login(e) | Self::Catalog(e) | Self::Client(e) => {
                Notice::error(rejection_or(e, messages::BACKEND_UNAVAILABLE))
            }
            Self::LoginRequired => Notice::warning(messages::LOGIN_REQUIRED),
            Self::DuplicateItem(_) => Notice::warning(messages::DUPLICATE_ITEM),
            Self::CartFetch(e) => Notice::error(rejection_or(e, messages::CART_FETCH_FAILED)),
            Self::CartUpdate(e) => Notice::warning(rejection_or(e, messages::ADD_FAILED)),
            Self::Session(_) => Notice::error(messages::SESSION_FAILED),
        }
    }

    /// Whether this is a failure the user cannot fix by changing input.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        match self {
            Self::Login(e) | Self::Catalog(e) | Self::CartFetch(e) | Self::CartUpdate(e) => {
                !e.is_rejection()
            }
            Self::Session(_) | Self::Client(_) => true,
            Self::InvalidUsername(_)
            | Self::MissingPassword
            | Self::LoginRejected(_)
            | Self::LoginRequired
            | Self::DuplicateItem(_) => false,
        }
    }

    /// Log the error, capturing unexpected ones to Sentry.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Operation failed");
        } else {
            tracing::info!(error = %self, "Operation refused");
        }
    }
}

fn rejection_or(err: &ApiError, fallback: &str) -> String {
    err.rejection_message().unwrap_or(fallback).to_string()
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// How a notice is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// A message for the user, with its severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Associate subsequent Sentry events with a username.
pub fn set_sentry_user(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Stop associating Sentry events with a user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Record a user action as a Sentry breadcrumb.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::from(*value));
    }

    sentry::add_breadcrumb(breadcrumb);
}
