//! Request and response bodies of the REST endpoints.
//!
//! Shared by the server handlers and the client so both sides agree on
//! field names and on the one error message that means "refresh and
//! retry".

use serde::{Deserialize, Serialize};

use crate::UserId;

/// Body `message` of a 401 that asks the client to refresh its access
/// token. Any other 401 means the token is unusable and must not be
/// retried.
pub const EXPIRED_TOKEN_MESSAGE: &str = "UnAuthorized, JWT Expired";

/// Body `message` of a 401 for a missing, forged, or malformed token.
pub const UNAUTHORIZED_MESSAGE: &str = "UnAuthorized";

/// `POST /auth/register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// `POST /auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/token`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    /// The refresh token.
    pub token: String,
}

/// `POST /auth/logout`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Reply to a successful register or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

/// Reply to a successful `POST /auth/token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Body of every non-2xx reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Whether this is the "refresh and retry" signal.
    pub fn is_expired_token(&self) -> bool {
        self.message == EXPIRED_TOKEN_MESSAGE
    }
}
