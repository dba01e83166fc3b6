//! Per-connection realtime handler: event dispatch and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task draining the connection's outbound queue
//!   2. Loop: receive frames → decode `ClientEvent` → dispatch
//!   3. On close, error, or idle timeout: unregister and stop the writer
//!
//! Any inbound frame resets the idle timer, pings and pongs included. The
//! writer pings the peer every half timeout so a listener that never sends
//! events still answers with pongs and stays registered.

use std::sync::Arc;
use std::time::Duration;

use quill_auth::UserStore;
use quill_protocol::{ClientEvent, Codec, ServerEvent};
use quill_session::{ConnectionHandle, SessionRegistry};
use quill_transport::{Connection, ConnectionId, Frame, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::server::ServerState;
use crate::QuillError;

/// Drop guard that removes the connection from the registry and stops
/// its writer when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct ConnectionGuard<R: SessionRegistry> {
    conn_id: ConnectionId,
    registry: Arc<R>,
    writer: JoinHandle<()>,
}

impl<R: SessionRegistry> Drop for ConnectionGuard<R> {
    fn drop(&mut self) {
        self.writer.abort();
        let conn_id = self.conn_id;
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            if let Some(user_id) = registry.unregister(conn_id).await {
                tracing::info!(%conn_id, %user_id, "user went offline");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, R>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, R>>,
) -> Result<(), QuillError>
where
    S: UserStore,
    R: SessionRegistry,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    let handle = ConnectionHandle::new(conn_id, tx);
    let writer = tokio::spawn(write_events(Arc::clone(&conn), rx, Arc::clone(&state)));
    let _guard = ConnectionGuard {
        conn_id,
        registry: Arc::clone(state.notifier.registry()),
        writer,
    };

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(Frame::Data(data)))) => data,
            Ok(Ok(Some(Frame::Heartbeat))) => continue,
            Ok(Ok(None)) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, "connection idle, closing");
                let _ = conn.close().await;
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode event");
                handle.deliver(ServerEvent::Error {
                    code: 400,
                    message: e.to_string(),
                });
                continue;
            }
        };

        dispatch(&state, &handle, event).await;
    }

    // _guard drops here → unregister fires.
    Ok(())
}

async fn dispatch<S, R>(state: &ServerState<S, R>, handle: &ConnectionHandle, event: ClientEvent)
where
    S: UserStore,
    R: SessionRegistry,
{
    let conn_id = handle.id();
    tracing::trace!(%conn_id, event = event.name(), "client event");

    match event {
        ClientEvent::Start(user) => {
            tracing::info!(%conn_id, user_id = %user.user_id, "user online");
            state
                .notifier
                .registry()
                .register(user.user_id, handle.clone())
                .await;
        }

        ClientEvent::Notify(target) => {
            state.notifier.notify(&target.user_id).await;
        }

        ClientEvent::CheckNotifications(user) => {
            let count = state.auth.store().unread_count(&user.user_id).await;
            handle.deliver(ServerEvent::notifications_count(count));
        }

        ClientEvent::ReadAll(user) => {
            let updated = state.auth.store().mark_all_read(&user.user_id).await;
            tracing::debug!(%conn_id, user_id = %user.user_id, updated, "notifications read");
        }
    }
}

/// Drains the outbound queue onto the socket, so pushes from other tasks
/// never wait on this connection's reads. Pings the peer when the queue
/// has been quiet for a keepalive period.
async fn write_events<S, R>(
    conn: Arc<WebSocketConnection>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    state: Arc<ServerState<S, R>>,
) where
    S: UserStore,
    R: SessionRegistry,
{
    let conn_id = conn.id();
    let period = keepalive_period(state.idle_timeout);
    let mut keepalive = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                let bytes = match state.codec.encode(&event) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(%conn_id, error = %e, "failed to encode event");
                        continue;
                    }
                };
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
                    break;
                }
            }
            _ = keepalive.tick() => {
                if let Err(e) = conn.ping().await {
                    tracing::debug!(%conn_id, error = %e, "ping failed, stopping writer");
                    break;
                }
            }
        }
    }
}

fn keepalive_period(idle_timeout: Duration) -> Duration {
    (idle_timeout / 2).max(Duration::from_millis(100))
}
