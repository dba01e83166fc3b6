//! Fire-and-forget notification delivery.

use std::sync::Arc;

use quill_protocol::{ServerEvent, UserId};

use crate::SessionRegistry;

/// Pokes a user's live socket with `haveNotifications: true`.
///
/// Delivery is at most once: no retry, no queue for offline users, and no
/// ordering relative to other events for the same user. Callers that care
/// about the poke arriving after the notification is stored must call
/// [`notify`](Self::notify) only once their write has completed.
pub struct Notifier<R: SessionRegistry> {
    registry: Arc<R>,
}

impl<R: SessionRegistry> Clone for Notifier<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<R: SessionRegistry> Notifier<R> {
    pub fn new(registry: Arc<R>) -> Self {
        Self { registry }
    }

    /// Returns `true` if `target` had a live connection that accepted the
    /// event. `false` (offline, or socket already closing) is a normal
    /// outcome.
    pub async fn notify(&self, target: &UserId) -> bool {
        let Some(handle) = self.registry.route(target).await else {
            tracing::debug!(%target, "notify target offline, dropping");
            return false;
        };
        let delivered = handle.deliver(ServerEvent::HaveNotifications(true));
        tracing::debug!(%target, conn_id = %handle.id(), delivered, "notify routed");
        delivered
    }

    /// The registry this notifier routes through.
    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }
}
