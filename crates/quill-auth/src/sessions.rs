//! Server-side refresh sessions.
//!
//! A refresh token is only honoured while its session (keyed by the
//! token's `jti`) is on record. Logout removes the record, so a logged-out
//! refresh token stops minting access tokens even though its signature
//! and expiry are still valid. Access tokens are never checked here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use quill_protocol::UserId;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct RefreshSession {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

/// Live refresh sessions, in memory.
#[derive(Debug, Default)]
pub struct RefreshSessions {
    sessions: Mutex<HashMap<String, RefreshSession>>,
}

impl RefreshSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new session. Expired sessions are swept on the way in so
    /// the map doesn't grow without bound.
    pub async fn open(
        &self,
        session_id: String,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, s| s.expires_at >= now);
        sessions.insert(session_id, RefreshSession { user_id, expires_at });
    }

    /// Returns `true` if `session_id` is on record for `user_id` and not
    /// past its expiry.
    pub async fn is_live(&self, session_id: &str, user_id: &UserId) -> bool {
        let sessions = self.sessions.lock().await;
        sessions
            .get(session_id)
            .is_some_and(|s| &s.user_id == user_id && s.expires_at >= Utc::now())
    }

    /// Ends a session. Returns `false` if it wasn't on record.
    pub async fn close(&self, session_id: &str) -> bool {
        self.sessions.lock().await.remove(session_id).is_some()
    }

    /// Number of sessions on record (including not-yet-swept expired ones).
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
