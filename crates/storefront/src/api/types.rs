//! Request and response bodies for the storefront backend.
//!
//! Responses whose shape depends on a `success` flag are decoded into a raw
//! struct first and then converted into an explicit enum, so callers never
//! branch on which optional fields happen to be present.

use qkart_core::{Price, ProductId};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::ApiError;

/// `POST /auth/login` request body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// `POST /cart` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUpdateRequest<'a> {
    pub product_id: &'a ProductId,
    pub qty: u32,
}

/// Error body returned with non-success statuses.
///
/// ```json
/// { "success": false, "message": "Protected route, Oauth2 Bearer token not found" }
/// ```
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub success: bool,
    pub message: String,
}

/// Raw `POST /auth/login` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    pub success: bool,
    pub token: Option<String>,
    pub username: Option<String>,
    pub balance: Option<Price>,
    pub message: Option<String>,
}

/// Credentials issued by a successful login.
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// Bearer token for cart requests.
    pub token: SecretString,
    /// Username the backend logged in.
    pub username: String,
    /// Wallet balance.
    pub balance: Price,
}

/// Outcome of a login request that reached the backend.
#[derive(Debug, Clone)]
pub enum LoginResponse {
    /// Credentials accepted.
    Authenticated(Authenticated),
    /// Credentials refused; `message` is shown to the user verbatim.
    Rejected { message: String },
}

impl TryFrom<LoginBody> for LoginResponse {
    type Error = ApiError;

    fn try_from(body: LoginBody) -> Result<Self, Self::Error> {
        if !body.success {
            return Ok(Self::Rejected {
                message: body
                    .message
                    .unwrap_or_else(|| "Login failed".to_string()),
            });
        }

        let token = body
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Malformed("login response has no token".to_string()))?;
        let username = body
            .username
            .ok_or_else(|| ApiError::Malformed("login response has no username".to_string()))?;

        Ok(Self::Authenticated(Authenticated {
            token: SecretString::from(token),
            username,
            balance: body.balance.unwrap_or(Price::ZERO),
        }))
    }
}
