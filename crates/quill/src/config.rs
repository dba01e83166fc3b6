//! Server configuration, read from `QUILL_*` environment variables.

use std::time::Duration;

use quill_auth::AuthConfig;
use serde::Deserialize;

use crate::QuillError;

const ENV_PREFIX: &str = "QUILL_";

/// Everything the server binary needs to start.
///
/// | Variable                  | Default          |
/// |---------------------------|------------------|
/// | `QUILL_HTTP_ADDR`         | `127.0.0.1:5000` |
/// | `QUILL_WS_ADDR`           | `127.0.0.1:5001` |
/// | `QUILL_JWT_SECRET`        | required         |
/// | `QUILL_ACCESS_TTL_SECS`   | `900`            |
/// | `QUILL_REFRESH_TTL_SECS`  | `604800`         |
/// | `QUILL_IDLE_TIMEOUT_SECS` | `300`            |
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    #[serde(default = "default_ws_addr")]
    pub ws_addr: String,

    pub jwt_secret: String,

    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,

    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,

    /// A realtime connection that sends nothing for this long is closed.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_http_addr() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_ws_addr() -> String {
    "127.0.0.1:5001".to_string()
}

fn default_access_ttl_secs() -> u64 {
    15 * 60
}

fn default_refresh_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_idle_timeout_secs() -> u64 {
    300
}

impl ServerConfig {
    /// Defaults everywhere except the signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            http_addr: default_http_addr(),
            ws_addr: default_ws_addr(),
            jwt_secret: jwt_secret.into(),
            access_ttl_secs: default_access_ttl_secs(),
            refresh_ttl_secs: default_refresh_ttl_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }

    /// Loads `.env` if there is one, then reads the process environment.
    ///
    /// # Errors
    /// [`QuillError::Config`] if `QUILL_JWT_SECRET` is missing or a
    /// numeric variable doesn't parse.
    pub fn from_env() -> Result<Self, QuillError> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Ok(envy::prefixed(ENV_PREFIX).from_env()?)
    }

    /// Like [`from_env`](Self::from_env) but over an explicit variable list.
    pub fn from_vars<I>(vars: I) -> Result<Self, QuillError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(vars)?)
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.jwt_secret.clone())
            .with_access_ttl(Duration::from_secs(self.access_ttl_secs))
            .with_refresh_ttl(Duration::from_secs(self.refresh_ttl_secs))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
