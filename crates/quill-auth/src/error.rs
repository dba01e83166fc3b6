//! Error types for the auth layer.

use quill_protocol::UserId;

/// Errors from the token lifecycle and credential checks.
///
/// The variants split into two families that callers must treat
/// differently:
///
/// - caller mistakes surfaced as 4xx with a message (`InvalidCredentials`,
///   `DuplicateEmail`, `Validation`);
/// - token failures, where `ExpiredAccessToken` is recoverable (refresh and
///   retry) and everything else is not.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately doesn't say which.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Another account already uses this email.
    #[error("email is already registered")]
    DuplicateEmail,

    /// Registration input was rejected. The message is user-facing.
    #[error("{0}")]
    Validation(String),

    /// The access token's signature is fine but it has expired.
    /// Clients recover by refreshing.
    #[error("access token expired")]
    ExpiredAccessToken,

    /// The access token is malformed, forged, or not an access token.
    #[error("invalid access token")]
    InvalidToken,

    /// The refresh token is forged, expired, of the wrong type, or its
    /// session was logged out. Clients must sign in again.
    #[error("invalid or expired refresh token")]
    InvalidOrExpiredRefreshToken,

    /// A token referenced a user the store doesn't know.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// Hashing, signing, or a blocking task failed.
    #[error("internal auth error: {0}")]
    Internal(String),
}

/// Errors raised by a [`UserStore`](crate::UserStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The email is already taken.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    /// No user with this id.
    #[error("user {0} not found")]
    NotFound(UserId),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(_) => Self::DuplicateEmail,
            StoreError::NotFound(id) => Self::UserNotFound(id),
        }
    }
}
