//! The per-connection handle the registry stores for each online user.

use quill_protocol::ServerEvent;
use quill_transport::ConnectionId;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// ConnectionHandle
// ---------------------------------------------------------------------------

/// A routable reference to one live realtime connection.
///
/// The handle does not own the socket. It owns the sending half of the
/// connection's outbound queue; the connection's writer task drains the
/// other half onto the wire. Cloning a handle is cheap.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    /// Creates a handle for connection `id` feeding `outbound`.
    pub fn new(
        id: ConnectionId,
        outbound: mpsc::UnboundedSender<ServerEvent>,
    ) -> Self {
        Self { id, outbound }
    }

    /// The connection this handle points at.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues an event for the connection.
    ///
    /// Returns `false` if the connection has already gone away. That is
    /// not an error: realtime delivery is best-effort.
    pub fn deliver(&self, event: ServerEvent) -> bool {
        self.outbound.send(event).is_ok()
    }

    /// Whether the connection's writer is still accepting events.
    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }
}
