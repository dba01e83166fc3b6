//! The session registry seam.
//!
//! Call sites only see [`SessionRegistry`]. The in-process
//! [`LocalSessionRegistry`] is enough for a single server; a deployment
//! with several processes needs an implementation backed by shared
//! pub/sub, and can drop in behind the same trait.

use std::future::Future;

use quill_protocol::UserId;
use quill_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::{ConnectionHandle, SessionMap};

/// Maps users to their live realtime connection.
///
/// None of these operations fail: an offline target is a normal outcome
/// (`route` returns `None`), not an error.
pub trait SessionRegistry: Send + Sync + 'static {
    /// Makes `handle` the live connection for `user_id`, replacing any
    /// previous one.
    fn register(
        &self,
        user_id: UserId,
        handle: ConnectionHandle,
    ) -> impl Future<Output = ()> + Send;

    /// Looks up the live connection for `user_id`.
    fn route(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Option<ConnectionHandle>> + Send;

    /// Forgets connection `conn_id`. A no-op if the connection was already
    /// superseded by a newer `register` for the same user.
    fn unregister(
        &self,
        conn_id: ConnectionId,
    ) -> impl Future<Output = Option<UserId>> + Send;

    /// Number of users currently online.
    fn online_count(&self) -> impl Future<Output = usize> + Send;
}

/// Single-process registry: a [`SessionMap`] behind one async mutex.
///
/// The lock is held only for the map operation itself, never across I/O.
#[derive(Debug, Default)]
pub struct LocalSessionRegistry {
    map: Mutex<SessionMap>,
}

impl LocalSessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRegistry for LocalSessionRegistry {
    async fn register(&self, user_id: UserId, handle: ConnectionHandle) {
        let conn_id = handle.id();
        let displaced = self.map.lock().await.register(user_id.clone(), handle);
        match displaced {
            Some(old) if old.id() != conn_id => {
                tracing::info!(
                    %user_id,
                    %conn_id,
                    replaced = %old.id(),
                    "session re-registered on new connection"
                );
            }
            Some(_) => {}
            None => tracing::info!(%user_id, %conn_id, "session registered"),
        }
    }

    async fn route(&self, user_id: &UserId) -> Option<ConnectionHandle> {
        self.map.lock().await.route(user_id).cloned()
    }

    async fn unregister(&self, conn_id: ConnectionId) -> Option<UserId> {
        let removed = self.map.lock().await.unregister(conn_id);
        match &removed {
            Some(user_id) => {
                tracing::info!(%user_id, %conn_id, "session unregistered");
            }
            None => {
                tracing::debug!(%conn_id, "no live session for connection");
            }
        }
        removed
    }

    async fn online_count(&self) -> usize {
        self.map.lock().await.len()
    }
}
