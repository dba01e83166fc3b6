//! The session map: forward and reverse indexes of online users.
//!
//! # Concurrency note
//!
//! `SessionMap` is NOT thread-safe by itself. It is plain data with two
//! `HashMap`s that must change together;
//! [`LocalSessionRegistry`](crate::LocalSessionRegistry) puts one lock
//! around the whole thing so the two indexes are never seen out of sync.

use std::collections::HashMap;

use quill_protocol::UserId;
use quill_transport::ConnectionId;

use crate::ConnectionHandle;

/// User → connection routing table with an O(1) reverse index.
///
/// ## Invariants
///
/// - At most one handle per user (last `register` wins).
/// - `connections[c] == u` iff `users[u].id() == c`.
///
/// ## Per-user lifecycle
///
/// ```text
///   offline ──(register)──→ online ──(unregister same conn)──→ offline
///                             │  ↑
///                             └──┘ register again (handle replaced)
/// ```
#[derive(Debug, Default)]
pub struct SessionMap {
    /// The current handle for each online user.
    users: HashMap<UserId, ConnectionHandle>,

    /// Which user each tracked connection belongs to.
    ///
    /// A disconnecting socket only knows its own connection id, so this
    /// index lets `unregister` find the row without scanning `users`.
    connections: HashMap<ConnectionId, UserId>,
}

impl SessionMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `handle` the live connection for `user_id`.
    ///
    /// Any handle previously registered for the user is forgotten, and so
    /// is any user previously registered on this same connection (a socket
    /// that sends `start` twice with different ids ends up owned by the
    /// second one). Returns the displaced handle, if any.
    pub fn register(
        &mut self,
        user_id: UserId,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        let conn_id = handle.id();

        if let Some(previous_user) = self.connections.remove(&conn_id) {
            if previous_user != user_id {
                self.users.remove(&previous_user);
            }
        }

        let displaced = self.users.insert(user_id.clone(), handle);
        if let Some(old) = &displaced {
            if old.id() != conn_id {
                self.connections.remove(&old.id());
            }
        }
        self.connections.insert(conn_id, user_id);

        displaced
    }

    /// Returns the live handle for `user_id`, if they are online.
    pub fn route(&self, user_id: &UserId) -> Option<&ConnectionHandle> {
        self.users.get(user_id)
    }

    /// Drops whatever user `conn_id` is currently serving.
    ///
    /// If the user has since reconnected on a different socket, the reverse
    /// index no longer points at `conn_id` and nothing is removed. Returns
    /// the user that went offline.
    pub fn unregister(&mut self, conn_id: ConnectionId) -> Option<UserId> {
        let user_id = self.connections.remove(&conn_id)?;
        self.users.remove(&user_id);
        Some(user_id)
    }

    /// Number of online users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if nobody is online.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        self.users.len() == self.connections.len()
            && self.users.iter().all(|(user, handle)| {
                self.connections.get(&handle.id()) == Some(user)
            })
    }
}

// =========================================================================
// Tests
// =========================================================================
