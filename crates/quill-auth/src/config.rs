//! Token lifetimes and signing secret.

use std::time::Duration;

/// Configuration for the token lifecycle.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify both token kinds.
    pub jwt_secret: String,

    /// How long an access token stays valid. Default: 15 minutes.
    pub access_ttl: Duration,

    /// How long a refresh token (and its server-side session) stays valid.
    /// Default: 7 days.
    pub refresh_ttl: Duration,
}

impl AuthConfig {
    /// Default lifetimes with the given signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }
}
