//! The token lifecycle: register, login, refresh, logout.

use std::sync::Arc;

use quill_protocol::UserId;
use serde::Serialize;

use crate::{
    hash_password, normalize_email, validate_registration, verify_password,
    AuthConfig, AuthError, NewUser, RefreshSessions, TokenIssuer, TokenPair,
    UserStore,
};

/// What a successful login or registration hands back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub user_id: UserId,
    pub tokens: TokenPair,
}

/// Authenticates credentials into token pairs and keeps refresh sessions.
///
/// ## Lifecycle
///
/// ```text
/// register() / login() ──→ (access, refresh) ──→ refresh() ──→ access'
///                                  │
///                                  └──→ logout() ──→ refresh() fails
/// ```
pub struct AuthService<S: UserStore> {
    store: Arc<S>,
    issuer: TokenIssuer,
    sessions: RefreshSessions,
}

impl<S: UserStore> AuthService<S> {
    /// # Errors
    /// [`AuthError::Internal`] if the configured lifetimes are unusable.
    pub fn new(store: Arc<S>, config: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            store,
            issuer: TokenIssuer::new(config)?,
            sessions: RefreshSessions::new(),
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Creates an account, then logs it in.
    ///
    /// # Errors
    /// - [`AuthError::Validation`]: bad email, short password, short name
    /// - [`AuthError::DuplicateEmail`]: email already registered
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthOutcome, AuthError> {
        validate_registration(email, password, name)?;

        let email = normalize_email(email);
        let password = password.to_owned();
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password(&password))
                .await
                .map_err(|e| AuthError::Internal(format!("hash task failed: {e}")))??;

        let user = self
            .store
            .insert(NewUser {
                email,
                name: name.trim().to_owned(),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        let tokens = self.issue_pair(&user.id).await?;
        Ok(AuthOutcome {
            user_id: user.id,
            tokens,
        })
    }

    /// Checks credentials and mints a fresh token pair.
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`] for an unknown email or a wrong
    /// password alike.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthOutcome, AuthError> {
        let Some(user) = self.store.find_by_email(&normalize_email(email)).await
        else {
            tracing::debug!("login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_owned();
        let hash = user.password_hash.clone();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("verify task failed: {e}")))?
            .inspect_err(|_| {
                tracing::debug!(user_id = %user.id, "login with wrong password");
            })?;

        tracing::info!(user_id = %user.id, "user logged in");
        let tokens = self.issue_pair(&user.id).await?;
        Ok(AuthOutcome {
            user_id: user.id,
            tokens,
        })
    }

    /// Mints a new access token from a refresh token. The refresh token
    /// itself is not rotated.
    ///
    /// # Errors
    /// [`AuthError::InvalidOrExpiredRefreshToken`] if the token is forged,
    /// expired, not a refresh token, or its session was logged out.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.issuer.verify_refresh(refresh_token)?;
        let user_id = claims.user_id();
        if !self.sessions.is_live(&claims.jti, &user_id).await {
            tracing::debug!(%user_id, "refresh with closed session");
            return Err(AuthError::InvalidOrExpiredRefreshToken);
        }

        tracing::debug!(%user_id, "access token refreshed");
        self.issuer.issue_access(&user_id)
    }

    /// Ends the refresh session behind `refresh_token`.
    ///
    /// Best-effort and infallible: an unreadable or already-closed token is
    /// simply ignored. Access tokens already handed out keep working until
    /// they expire.
    pub async fn logout(&self, refresh_token: &str) {
        match self.issuer.verify_refresh(refresh_token) {
            Ok(claims) => {
                if self.sessions.close(&claims.jti).await {
                    tracing::info!(user_id = %claims.sub, "user logged out");
                }
            }
            Err(_) => tracing::debug!("logout with unusable refresh token"),
        }
    }

    /// Resolves a bearer access token to its user.
    ///
    /// # Errors
    /// - [`AuthError::ExpiredAccessToken`]: refresh and retry
    /// - [`AuthError::InvalidToken`]: don't retry
    pub fn authenticate(&self, access_token: &str) -> Result<UserId, AuthError> {
        self.issuer
            .verify_access(access_token)
            .map(|claims| claims.user_id())
    }

    async fn issue_pair(&self, user_id: &UserId) -> Result<TokenPair, AuthError> {
        let access_token = self.issuer.issue_access(user_id)?;
        let (refresh_token, claims) = self.issuer.issue_refresh(user_id)?;
        self.sessions
            .open(claims.jti.clone(), user_id.clone(), claims.expires_at())
            .await;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
