//! Interceptor behaviour against a scripted server.
//!
//! The stub server accepts exactly one access token at a time. Anything
//! starting with `stale-` gets the expiry signal; anything else gets a
//! plain 401. Refresh calls are counted and slowed down so concurrent
//! expirations overlap.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use quill_client::{ApiClient, ClientError, CredentialStore, Credentials, MemoryCredentials};
use quill_protocol::http::{
    AccessTokenResponse, AuthResponse, ErrorBody, LoginRequest, TokenRequest,
    EXPIRED_TOKEN_MESSAGE, UNAUTHORIZED_MESSAGE,
};
use quill_protocol::UserId;

const REFRESH_TOKEN: &str = "refresh-good";

#[derive(Default)]
struct Stub {
    current_access: Mutex<String>,
    refreshes: AtomicUsize,
    protected_hits: AtomicUsize,
}

type Reply = (StatusCode, Json<serde_json::Value>);

async fn me(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Reply {
    stub.protected_hits.fetch_add(1, Ordering::SeqCst);
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("")
        .to_owned();
    let current = stub.current_access.lock().unwrap().clone();
    if token == current {
        (StatusCode::OK, Json(serde_json::json!({ "name": "Alice" })))
    } else if token.starts_with("stale-") {
        let body = ErrorBody::new(EXPIRED_TOKEN_MESSAGE);
        (StatusCode::UNAUTHORIZED, Json(serde_json::to_value(body).unwrap()))
    } else {
        let body = ErrorBody::new(UNAUTHORIZED_MESSAGE);
        (StatusCode::UNAUTHORIZED, Json(serde_json::to_value(body).unwrap()))
    }
}

async fn token(State(stub): State<Arc<Stub>>, Json(req): Json<TokenRequest>) -> Reply {
    let n = stub.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
    tokio::time::sleep(Duration::from_millis(50)).await;
    if req.token != REFRESH_TOKEN {
        let body = ErrorBody::new("Invalid or expired refresh token");
        return (StatusCode::UNAUTHORIZED, Json(serde_json::to_value(body).unwrap()));
    }
    let access = format!("access-{n}");
    *stub.current_access.lock().unwrap() = access.clone();
    let body = AccessTokenResponse {
        access_token: access,
    };
    (StatusCode::OK, Json(serde_json::to_value(body).unwrap()))
}

async fn login(State(stub): State<Arc<Stub>>, Json(req): Json<LoginRequest>) -> Reply {
    if req.password != "secret123" {
        let body = ErrorBody::new("Invalid credentials");
        return (StatusCode::UNAUTHORIZED, Json(serde_json::to_value(body).unwrap()));
    }
    let access = "access-login".to_owned();
    *stub.current_access.lock().unwrap() = access.clone();
    let body = AuthResponse {
        access_token: access,
        refresh_token: REFRESH_TOKEN.into(),
        user_id: UserId::new("u1"),
    };
    (StatusCode::OK, Json(serde_json::to_value(body).unwrap()))
}

async fn spawn_stub() -> (SocketAddr, Arc<Stub>) {
    let stub = Arc::new(Stub::default());
    *stub.current_access.lock().unwrap() = "access-0".into();
    let app = Router::new()
        .route("/user/me", get(me))
        .route("/auth/token", post(token))
        .route("/auth/login", post(login))
        .with_state(Arc::clone(&stub));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, stub)
}

fn client_with(
    addr: SocketAddr,
    access: &str,
    refresh: &str,
) -> (ApiClient<MemoryCredentials>, Arc<AtomicUsize>) {
    let signed_out = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&signed_out);
    let creds = MemoryCredentials::with(Credentials {
        access_token: access.into(),
        refresh_token: refresh.into(),
    });
    let client = ApiClient::new(format!("http://{addr}"), creds, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (client, signed_out)
}

// =========================================================================
// Pass-through
// =========================================================================

#[tokio::test]
async fn test_send_valid_token_passes_through() {
    let (addr, stub) = spawn_stub().await;
    let (client, _) = client_with(addr, "access-0", REFRESH_TOKEN);

    let resp = client.get("/user/me").await.unwrap();

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(stub.refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_send_plain_unauthorized_is_not_retried() {
    let (addr, stub) = spawn_stub().await;
    let (client, signed_out) = client_with(addr, "forged", REFRESH_TOKEN);

    let resp = client.get("/user/me").await.unwrap();

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_body().unwrap().message, UNAUTHORIZED_MESSAGE);
    assert_eq!(stub.refreshes.load(Ordering::SeqCst), 0);
    assert_eq!(stub.protected_hits.load(Ordering::SeqCst), 1);
    assert_eq!(signed_out.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_send_expired_without_refresh_token_returns_original_401() {
    let (addr, stub) = spawn_stub().await;
    let client = ApiClient::new(format!("http://{addr}"), MemoryCredentials::new(), || {});

    let resp = client
        .send(|http| {
            http.get(format!("http://{addr}/user/me"))
                .bearer_auth("stale-x")
        })
        .await
        .unwrap();

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(resp.error_body().unwrap().is_expired_token());
    assert_eq!(stub.refreshes.load(Ordering::SeqCst), 0);
}

// =========================================================================
// Refresh and retry
// =========================================================================

#[tokio::test]
async fn test_send_expired_token_refreshes_and_retries_once() {
    let (addr, stub) = spawn_stub().await;
    let (client, signed_out) = client_with(addr, "stale-1", REFRESH_TOKEN);

    let resp = client.get("/user/me").await.unwrap();

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(stub.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(stub.protected_hits.load(Ordering::SeqCst), 2);
    assert_eq!(
        client.credentials().access_token().as_deref(),
        Some("access-1")
    );
    assert_eq!(
        client.credentials().refresh_token().as_deref(),
        Some(REFRESH_TOKEN)
    );
    assert_eq!(signed_out.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_send_concurrent_expiry_shares_one_refresh() {
    let (addr, stub) = spawn_stub().await;
    let (client, _) = client_with(addr, "stale-1", REFRESH_TOKEN);

    let mut tasks = Vec::new();
    for _ in 0..5 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move { client.get("/user/me").await }));
    }
    for task in tasks {
        let resp = task.await.unwrap().unwrap();
        assert_eq!(resp.status, StatusCode::OK);
    }

    assert_eq!(stub.refreshes.load(Ordering::SeqCst), 1);
}

// =========================================================================
// Refresh failure
// =========================================================================

#[tokio::test]
async fn test_send_rejected_refresh_clears_credentials_and_signs_out() {
    let (addr, stub) = spawn_stub().await;
    let (client, signed_out) = client_with(addr, "stale-1", "refresh-revoked");

    let err = client.get("/user/me").await.unwrap_err();

    assert!(matches!(err, ClientError::SessionExpired));
    assert!(client.credentials().access_token().is_none());
    assert!(client.credentials().refresh_token().is_none());
    assert_eq!(signed_out.load(Ordering::SeqCst), 1);
    // The original request is not retried after a failed refresh.
    assert_eq!(stub.protected_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_send_concurrent_rejected_refresh_signs_out_once() {
    let (addr, stub) = spawn_stub().await;
    let (client, signed_out) = client_with(addr, "stale-1", "refresh-revoked");

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move { client.get("/user/me").await }));
    }
    for task in tasks {
        match task.await.unwrap() {
            Err(ClientError::SessionExpired) => {}
            // A request that started after the wipe goes out without a
            // token and gets a plain 401.
            Ok(resp) => assert_eq!(resp.status, StatusCode::UNAUTHORIZED),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(stub.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(signed_out.load(Ordering::SeqCst), 1);
}

// =========================================================================
// Login / logout
// =========================================================================

#[tokio::test]
async fn test_login_stores_credentials() {
    let (addr, _stub) = spawn_stub().await;
    let client = ApiClient::new(format!("http://{addr}"), MemoryCredentials::new(), || {});

    let auth = client
        .login(&LoginRequest {
            email: "a@x.io".into(),
            password: "secret123".into(),
        })
        .await
        .unwrap();

    assert_eq!(auth.user_id.as_str(), "u1");
    assert_eq!(
        client.credentials().access_token().as_deref(),
        Some("access-login")
    );
    let resp = client.get("/user/me").await.unwrap();
    assert!(resp.is_success());
}

#[tokio::test]
async fn test_login_wrong_password_is_rejected() {
    let (addr, _stub) = spawn_stub().await;
    let client = ApiClient::new(format!("http://{addr}"), MemoryCredentials::new(), || {});

    let err = client
        .login(&LoginRequest {
            email: "a@x.io".into(),
            password: "nope".into(),
        })
        .await
        .unwrap_err();

    match err {
        ClientError::Rejected { status, message } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
    assert!(client.credentials().access_token().is_none());
}

#[tokio::test]
async fn test_logout_clears_without_sign_out_hook() {
    let (addr, _stub) = spawn_stub().await;
    let (client, signed_out) = client_with(addr, "access-0", REFRESH_TOKEN);

    // The stub has no /auth/logout route; the 404 is ignored.
    client.logout().await.unwrap();

    assert!(client.credentials().refresh_token().is_none());
    assert_eq!(signed_out.load(Ordering::SeqCst), 0);
}
