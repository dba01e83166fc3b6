//! Error types for the client.

use reqwest::StatusCode;

/// Errors an [`ApiClient`](crate::ApiClient) call can end with.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never got an HTTP answer.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server refused a login/registration call.
    #[error("rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// The access token expired and the refresh token was refused.
    /// Stored credentials have been cleared; the user must sign in again.
    #[error("session expired, sign in again")]
    SessionExpired,

    /// A response body didn't have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}
