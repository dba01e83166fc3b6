//! The request interceptor.

use std::sync::Arc;

use quill_protocol::http::{
    AccessTokenResponse, AuthResponse, ErrorBody, LoginRequest, LogoutRequest, RegisterRequest,
    TokenRequest,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::credentials::{CredentialStore, Credentials, SignOut};
use crate::ClientError;

/// A finished HTTP exchange, after any refresh-and-retry.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The server's error body, if this is one.
    pub fn error_body(&self) -> Option<ErrorBody> {
        if self.is_success() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }

    fn is_expired_token(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
            && self.error_body().is_some_and(|b| b.is_expired_token())
    }
}

struct Inner<C> {
    http: Client,
    base_url: String,
    credentials: C,
    sign_out: Box<dyn SignOut>,
    /// Held for the duration of a refresh call so concurrent expirations
    /// share one round trip.
    refresh_lock: tokio::sync::Mutex<()>,
}

/// HTTP client that keeps the user signed in across access-token expiry.
///
/// Cheap to clone; clones share credentials and the refresh lock.
pub struct ApiClient<C: CredentialStore> {
    inner: Arc<Inner<C>>,
}

impl<C: CredentialStore> Clone for ApiClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: CredentialStore> ApiClient<C> {
    /// `base_url` is the server root, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>, credentials: C, sign_out: impl SignOut) -> Self {
        Self::with_http(Client::new(), base_url, credentials, sign_out)
    }

    pub fn with_http(
        http: Client,
        base_url: impl Into<String>,
        credentials: C,
        sign_out: impl SignOut,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                credentials,
                sign_out: Box::new(sign_out),
                refresh_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn credentials(&self) -> &C {
        &self.inner.credentials
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Sends an authenticated request.
    ///
    /// `build` is called once per attempt with the underlying
    /// [`reqwest::Client`]; the bearer token is added afterwards. A 401
    /// carrying the expiry signal triggers one refresh and one retry. Any
    /// other response, including other 401s, is returned as-is.
    pub async fn send<F>(&self, build: F) -> Result<ApiResponse, ClientError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let token = self.inner.credentials.access_token();
        let first = self.execute(&build, token.as_deref()).await?;
        if !first.is_expired_token() {
            return Ok(first);
        }

        if self.inner.credentials.refresh_token().is_none() {
            return Ok(first);
        }

        tracing::debug!("access token expired, refreshing");
        let fresh = self.refresh_after(token.as_deref()).await?;
        self.execute(&build, Some(&fresh)).await
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ClientError> {
        let url = self.url(path);
        self.send(|http| http.get(&url)).await
    }

    pub async fn post(&self, path: &str) -> Result<ApiResponse, ClientError> {
        let url = self.url(path);
        self.send(|http| http.post(&url)).await
    }

    pub async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ClientError> {
        let url = self.url(path);
        self.send(|http| http.post(&url).json(body)).await
    }

    /// Creates an account and stores the issued tokens.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        self.authenticate_with("/auth/register", request).await
    }

    /// Signs in and stores the issued tokens.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.authenticate_with("/auth/login", request).await
    }

    /// Revokes the refresh token server-side (best effort) and forgets
    /// local credentials. Does not fire the sign-out hook.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if let Some(refresh_token) = self.inner.credentials.refresh_token() {
            let body = LogoutRequest { refresh_token };
            let result = self
                .inner
                .http
                .post(self.url("/auth/logout"))
                .json(&body)
                .send()
                .await;
            if let Err(e) = result {
                tracing::debug!(error = %e, "logout request failed");
            }
        }
        self.inner.credentials.clear();
        Ok(())
    }

    async fn authenticate_with<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthResponse, ClientError> {
        let response = self.inner.http.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|b| b.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(ClientError::Rejected { status, message });
        }
        let auth: AuthResponse = serde_json::from_slice(&bytes)?;
        self.inner.credentials.store(Credentials {
            access_token: auth.access_token.clone(),
            refresh_token: auth.refresh_token.clone(),
        });
        Ok(auth)
    }

    async fn execute<F>(&self, build: &F, token: Option<&str>) -> Result<ApiResponse, ClientError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut request = build(&self.inner.http);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(ApiResponse { status, body })
    }

    /// Returns a fresh access token, refreshing only if nobody else has
    /// replaced `stale` while we waited for the lock.
    async fn refresh_after(&self, stale: Option<&str>) -> Result<String, ClientError> {
        let _guard = self.inner.refresh_lock.lock().await;

        let current = self.inner.credentials.access_token();
        if let Some(current) = current {
            if Some(current.as_str()) != stale {
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.inner.credentials.refresh_token() else {
            // Another caller's refresh failed and cleared everything.
            return Err(ClientError::SessionExpired);
        };

        let result = self
            .inner
            .http
            .post(self.url("/auth/token"))
            .json(&TokenRequest {
                token: refresh_token,
            })
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "token refresh request failed");
                self.expire_session();
                return Err(ClientError::SessionExpired);
            }
        };

        if !response.status().is_success() {
            tracing::info!(status = %response.status(), "refresh token rejected");
            self.expire_session();
            return Err(ClientError::SessionExpired);
        }

        match response.json::<AccessTokenResponse>().await {
            Ok(body) => {
                self.inner
                    .credentials
                    .set_access_token(body.access_token.clone());
                tracing::debug!("access token refreshed");
                Ok(body.access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "unreadable refresh response");
                self.expire_session();
                Err(ClientError::SessionExpired)
            }
        }
    }

    fn expire_session(&self) {
        if self.inner.credentials.clear() {
            self.inner.sign_out.sign_out();
        }
    }
}
