//! HTTP error mapping and the bearer-token extractor.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{async_trait, Json};
use quill_auth::{AuthError, StoreError, UserStore};
use quill_protocol::http::{ErrorBody, EXPIRED_TOKEN_MESSAGE, UNAUTHORIZED_MESSAGE};
use quill_protocol::UserId;
use quill_session::SessionRegistry;

use crate::server::ServerState;

/// Everything a REST handler can fail with. Every variant renders as a
/// `{"message": ...}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// No usable `Authorization: Bearer` header.
    #[error("missing bearer token")]
    MissingToken,

    /// Malformed request, with a user-facing reason.
    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Auth(err) => match err {
                AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                AuthError::DuplicateEmail => (StatusCode::BAD_REQUEST, err.to_string()),
                AuthError::InvalidCredentials | AuthError::InvalidOrExpiredRefreshToken => {
                    (StatusCode::UNAUTHORIZED, err.to_string())
                }
                AuthError::ExpiredAccessToken => {
                    (StatusCode::UNAUTHORIZED, EXPIRED_TOKEN_MESSAGE.to_string())
                }
                AuthError::InvalidToken => {
                    (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE.to_string())
                }
                AuthError::UserNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                AuthError::Internal(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                ),
            },
            Self::Store(err) => match err {
                StoreError::DuplicateEmail(_) => {
                    (StatusCode::BAD_REQUEST, AuthError::DuplicateEmail.to_string())
                }
                StoreError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
            },
            Self::MissingToken => (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(%status, error = %self, "request rejected");
        }
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// The user behind a valid `Authorization: Bearer <access token>` header.
///
/// Rejects with the expiry message when the token has merely expired, so
/// clients know to refresh, and with a plain 401 otherwise.
#[derive(Debug, Clone)]
pub(crate) struct AuthUser(pub(crate) UserId);

#[async_trait]
impl<S, R> FromRequestParts<Arc<ServerState<S, R>>> for AuthUser
where
    S: UserStore,
    R: SessionRegistry,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ServerState<S, R>>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::MissingToken)?;

        let user_id = state.auth.authenticate(token)?;
        Ok(Self(user_id))
    }
}
