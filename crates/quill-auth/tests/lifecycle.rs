//! Integration tests for the token lifecycle through `AuthService`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use quill_auth::{
    AuthConfig, AuthError, AuthService, InMemoryUserStore, UserStore,
};

fn service() -> AuthService<InMemoryUserStore> {
    AuthService::new(
        Arc::new(InMemoryUserStore::new()),
        &AuthConfig::new("lifecycle-secret"),
    )
    .expect("service should build")
}

#[tokio::test]
async fn test_register_returns_tokens_that_authenticate() {
    let auth = service();

    let outcome = auth
        .register("ada@example.com", "analytical", "Ada")
        .await
        .expect("register should succeed");

    let user_id = auth
        .authenticate(&outcome.tokens.access_token)
        .expect("access token should authenticate");
    assert_eq!(user_id, outcome.user_id);
}

#[tokio::test]
async fn test_register_normalizes_email_and_trims_name() {
    let auth = service();

    let outcome = auth
        .register("  Ada@Example.com ", "analytical", "  Ada Lovelace ")
        .await
        .unwrap();

    let user = auth.store().find_by_id(&outcome.user_id).await.unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.name, "Ada Lovelace");
    assert!(user.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn test_register_duplicate_email_fails() {
    let auth = service();
    auth.register("ada@example.com", "analytical", "Ada")
        .await
        .unwrap();

    let result = auth.register("ADA@example.com", "different1", "Ada 2").await;

    assert!(matches!(result, Err(AuthError::DuplicateEmail)));
}

#[tokio::test]
async fn test_register_invalid_input_fails_with_validation() {
    let auth = service();

    let result = auth.register("ada@example.com", "short", "Ada").await;

    assert!(matches!(result, Err(AuthError::Validation(_))));
}

#[tokio::test]
async fn test_login_correct_password_returns_pair() {
    let auth = service();
    let registered = auth
        .register("ada@example.com", "analytical", "Ada")
        .await
        .unwrap();

    let outcome = auth
        .login("ada@example.com", "analytical")
        .await
        .expect("login should succeed");

    assert_eq!(outcome.user_id, registered.user_id);
    assert!(auth.authenticate(&outcome.tokens.access_token).is_ok());
}

#[tokio::test]
async fn test_login_wrong_password_returns_invalid_credentials() {
    let auth = service();
    auth.register("ada@example.com", "analytical", "Ada")
        .await
        .unwrap();

    let result = auth.login("ada@example.com", "wrong-password").await;

    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_unknown_email_returns_invalid_credentials() {
    let auth = service();

    let result = auth.login("nobody@example.com", "whatever1").await;

    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_refresh_returns_independent_access_token() {
    let auth = service();
    let outcome = auth
        .register("ada@example.com", "analytical", "Ada")
        .await
        .unwrap();

    let access = auth
        .refresh(&outcome.tokens.refresh_token)
        .await
        .expect("refresh should succeed");

    assert_ne!(access, outcome.tokens.access_token);
    assert_eq!(auth.authenticate(&access).unwrap(), outcome.user_id);
}

#[tokio::test]
async fn test_refresh_is_repeatable_without_rotation() {
    let auth = service();
    let outcome = auth
        .register("ada@example.com", "analytical", "Ada")
        .await
        .unwrap();

    auth.refresh(&outcome.tokens.refresh_token).await.unwrap();
    let second = auth.refresh(&outcome.tokens.refresh_token).await;

    assert!(second.is_ok(), "same refresh token keeps working");
}

#[tokio::test]
async fn test_refresh_tampered_token_fails_closed() {
    let auth = service();
    let outcome = auth
        .register("ada@example.com", "analytical", "Ada")
        .await
        .unwrap();
    let mut tampered = outcome.tokens.refresh_token.clone();
    tampered.pop();

    let result = auth.refresh(&tampered).await;

    assert!(matches!(result, Err(AuthError::InvalidOrExpiredRefreshToken)));
}

#[tokio::test]
async fn test_refresh_with_access_token_fails_closed() {
    let auth = service();
    let outcome = auth
        .register("ada@example.com", "analytical", "Ada")
        .await
        .unwrap();

    let result = auth.refresh(&outcome.tokens.access_token).await;

    assert!(matches!(result, Err(AuthError::InvalidOrExpiredRefreshToken)));
}

#[tokio::test]
async fn test_refresh_expired_token_fails_closed() {
    let auth = AuthService::new(
        Arc::new(InMemoryUserStore::new()),
        &AuthConfig::new("s").with_refresh_ttl(Duration::from_secs(60)),
    )
    .unwrap();
    let outcome = auth
        .register("ada@example.com", "analytical", "Ada")
        .await
        .unwrap();
    // A refresh token minted an hour ago with a one-minute lifetime.
    let (stale, _) = auth
        .issuer()
        .issue_refresh_at(&outcome.user_id, Utc::now() - chrono::Duration::hours(1))
        .unwrap();

    let result = auth.refresh(&stale).await;

    assert!(matches!(result, Err(AuthError::InvalidOrExpiredRefreshToken)));
}

#[tokio::test]
async fn test_refresh_unrecorded_session_fails_closed() {
    // Correctly signed, unexpired, but never handed out by login.
    let auth = service();
    let outcome = auth
        .register("ada@example.com", "analytical", "Ada")
        .await
        .unwrap();
    let (unrecorded, _) = auth.issuer().issue_refresh(&outcome.user_id).unwrap();

    let result = auth.refresh(&unrecorded).await;

    assert!(matches!(result, Err(AuthError::InvalidOrExpiredRefreshToken)));
}

#[tokio::test]
async fn test_logout_invalidates_refresh_but_not_access() {
    let auth = service();
    let outcome = auth
        .register("ada@example.com", "analytical", "Ada")
        .await
        .unwrap();

    auth.logout(&outcome.tokens.refresh_token).await;

    assert!(matches!(
        auth.refresh(&outcome.tokens.refresh_token).await,
        Err(AuthError::InvalidOrExpiredRefreshToken)
    ));
    // Access tokens are not revocation-checked.
    assert!(auth.authenticate(&outcome.tokens.access_token).is_ok());
}

#[tokio::test]
async fn test_logout_only_ends_its_own_session() {
    let auth = service();
    let first = auth
        .register("ada@example.com", "analytical", "Ada")
        .await
        .unwrap();
    let second = auth.login("ada@example.com", "analytical").await.unwrap();

    auth.logout(&first.tokens.refresh_token).await;

    assert!(auth.refresh(&second.tokens.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_logout_garbage_token_is_noop() {
    let auth = service();
    auth.logout("garbage").await;
    auth.logout("").await;
}

#[tokio::test]
async fn test_authenticate_expired_access_reports_expired() {
    let auth = service();
    let outcome = auth
        .register("ada@example.com", "analytical", "Ada")
        .await
        .unwrap();
    let expired = auth
        .issuer()
        .issue_access_at(&outcome.user_id, Utc::now() - chrono::Duration::hours(1))
        .unwrap();

    assert!(matches!(
        auth.authenticate(&expired),
        Err(AuthError::ExpiredAccessToken)
    ));
}
