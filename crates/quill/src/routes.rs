//! REST routes: the token endpoints and the protected `/user` API.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use quill_auth::{AuthOutcome, Notification, UserStore};
use quill_protocol::http::{
    AccessTokenResponse, AuthResponse, LoginRequest, LogoutRequest, RegisterRequest, TokenRequest,
};
use quill_protocol::UserId;
use quill_session::SessionRegistry;
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, AuthUser};
use crate::server::ServerState;

type AppState<S, R> = State<Arc<ServerState<S, R>>>;

/// `GET /user/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

/// `GET /user/notifications`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

/// `POST /user/notifications/read`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkedRead {
    pub updated: usize,
}

/// `POST /user/follow/:id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowResult {
    /// `false` if the caller already followed this user.
    pub followed: bool,
}

pub(crate) fn router<S, R>(state: Arc<ServerState<S, R>>) -> Router
where
    S: UserStore,
    R: SessionRegistry,
{
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register::<S, R>))
        .route("/auth/login", post(login::<S, R>))
        .route("/auth/token", post(token::<S, R>))
        .route("/auth/logout", post(logout::<S, R>))
        .route("/user/me", get(me::<S, R>))
        .route("/user/notifications", get(notifications::<S, R>))
        .route("/user/notifications/read", post(read_notifications::<S, R>))
        .route("/user/follow/:id", post(follow::<S, R>))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

fn auth_response(outcome: AuthOutcome) -> AuthResponse {
    AuthResponse {
        access_token: outcome.tokens.access_token,
        refresh_token: outcome.tokens.refresh_token,
        user_id: outcome.user_id,
    }
}

// ---------------------------------------------------------------------------
// /auth
// ---------------------------------------------------------------------------

async fn register<S: UserStore, R: SessionRegistry>(
    State(state): AppState<S, R>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;
    let outcome = state
        .auth
        .register(&req.email, &req.password, &req.name)
        .await?;
    Ok(Json(auth_response(outcome)))
}

async fn login<S: UserStore, R: SessionRegistry>(
    State(state): AppState<S, R>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;
    let outcome = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(auth_response(outcome)))
}

async fn token<S: UserStore, R: SessionRegistry>(
    State(state): AppState<S, R>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let Json(req) = payload?;
    let access_token = state.auth.refresh(&req.token).await?;
    Ok(Json(AccessTokenResponse { access_token }))
}

/// Always succeeds, even for an unreadable body.
async fn logout<S: UserStore, R: SessionRegistry>(
    State(state): AppState<S, R>,
    payload: Result<Json<LogoutRequest>, JsonRejection>,
) -> Json<serde_json::Value> {
    if let Ok(Json(req)) = payload {
        state.auth.logout(&req.refresh_token).await;
    }
    Json(serde_json::json!({ "message": "Logged out" }))
}

// ---------------------------------------------------------------------------
// /user
// ---------------------------------------------------------------------------

async fn me<S: UserStore, R: SessionRegistry>(
    State(state): AppState<S, R>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Profile>, ApiError> {
    let user = state
        .auth
        .store()
        .find_by_id(&user_id)
        .await
        .ok_or(quill_auth::AuthError::UserNotFound(user_id))?;
    Ok(Json(Profile {
        id: user.id,
        email: user.email,
        name: user.name,
    }))
}

async fn notifications<S: UserStore, R: SessionRegistry>(
    State(state): AppState<S, R>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<NotificationList>, ApiError> {
    let user = state
        .auth
        .store()
        .find_by_id(&user_id)
        .await
        .ok_or(quill_auth::AuthError::UserNotFound(user_id))?;
    let unread = user.unread_count();
    Ok(Json(NotificationList {
        notifications: user.notifications,
        unread,
    }))
}

async fn read_notifications<S: UserStore, R: SessionRegistry>(
    State(state): AppState<S, R>,
    AuthUser(user_id): AuthUser,
) -> Json<MarkedRead> {
    let updated = state.auth.store().mark_all_read(&user_id).await;
    Json(MarkedRead { updated })
}

/// Records the follow and its notification, then pokes the target's
/// socket. The poke is sent only after both writes have landed, so a
/// client reacting to it always sees the new notification.
async fn follow<S: UserStore, R: SessionRegistry>(
    State(state): AppState<S, R>,
    AuthUser(me): AuthUser,
    Path(target): Path<String>,
) -> Result<Json<FollowResult>, ApiError> {
    let target = UserId::new(target);
    if target == me {
        return Err(ApiError::BadRequest("You cannot follow yourself".into()));
    }

    let store = state.auth.store();
    let followed = store.follow(&me, &target).await?;
    if followed {
        store.push_notification(&target, me.clone()).await?;
        let delivered = state.notifier.notify(&target).await;
        tracing::info!(follower = %me, %target, delivered, "user followed");
    }
    Ok(Json(FollowResult { followed }))
}
