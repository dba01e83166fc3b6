//! `QuillServer` builder and server loop.
//!
//! This is the entry point for running a Quill backend. It ties together
//! the two listeners: the REST API (axum) and the realtime notification
//! socket (transport → protocol → session registry).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use quill_auth::{AuthService, InMemoryUserStore, UserStore};
use quill_protocol::JsonCodec;
use quill_session::{LocalSessionRegistry, Notifier, SessionRegistry};
use quill_transport::{Transport, WebSocketTransport};
use tokio::net::TcpListener;

use crate::handler::handle_connection;
use crate::routes::router;
use crate::{QuillError, ServerConfig};

/// Shared server state passed to every REST handler and realtime
/// connection task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState<S: UserStore, R: SessionRegistry> {
    pub(crate) auth: AuthService<S>,
    pub(crate) notifier: Notifier<R>,
    pub(crate) codec: JsonCodec,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Quill server.
///
/// # Example
///
/// ```rust,ignore
/// use quill::prelude::*;
///
/// let server = QuillServerBuilder::new(ServerConfig::from_env()?)
///     .http_addr("0.0.0.0:5000")
///     .build_in_memory()
///     .await?;
/// server.run().await
/// ```
pub struct QuillServerBuilder {
    config: ServerConfig,
}

impl QuillServerBuilder {
    /// Starts from an existing configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Sets the address of the REST listener.
    pub fn http_addr(mut self, addr: &str) -> Self {
        self.config.http_addr = addr.to_string();
        self
    }

    /// Sets the address of the realtime listener.
    pub fn ws_addr(mut self, addr: &str) -> Self {
        self.config.ws_addr = addr.to_string();
        self
    }

    /// Sets how long an access token stays valid.
    pub fn access_ttl(mut self, ttl: Duration) -> Self {
        self.config.access_ttl_secs = ttl.as_secs();
        self
    }

    /// Sets how long a silent realtime connection is kept open.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout_secs = timeout.as_secs();
        self
    }

    /// Binds both listeners using the given store and registry.
    pub async fn build<S, R>(
        self,
        store: Arc<S>,
        registry: Arc<R>,
    ) -> Result<QuillServer<S, R>, QuillError>
    where
        S: UserStore,
        R: SessionRegistry,
    {
        let auth = AuthService::new(store, &self.config.auth_config())?;
        let http = TcpListener::bind(&self.config.http_addr).await?;
        let transport = WebSocketTransport::bind(&self.config.ws_addr).await?;

        let state = Arc::new(ServerState {
            auth,
            notifier: Notifier::new(registry),
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout(),
        });

        Ok(QuillServer {
            http,
            transport,
            state,
        })
    }

    /// Binds both listeners with an in-memory store and a single-process
    /// registry.
    pub async fn build_in_memory(
        self,
    ) -> Result<QuillServer<InMemoryUserStore, LocalSessionRegistry>, QuillError> {
        self.build(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(LocalSessionRegistry::new()),
        )
        .await
    }
}

/// A bound Quill server.
///
/// Call [`run()`](Self::run) to start serving.
pub struct QuillServer<S: UserStore, R: SessionRegistry> {
    http: TcpListener,
    transport: WebSocketTransport,
    state: Arc<ServerState<S, R>>,
}

impl<S, R> QuillServer<S, R>
where
    S: UserStore,
    R: SessionRegistry,
{
    /// Address of the REST listener.
    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.http.local_addr()
    }

    /// Address of the realtime listener.
    pub fn ws_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The REST API as a standalone router sharing this server's state.
    pub fn router(&self) -> Router {
        router(Arc::clone(&self.state))
    }

    /// The session registry realtime connections register in.
    pub fn registry(&self) -> &Arc<R> {
        self.state.notifier.registry()
    }

    /// Runs both listeners until the REST server fails.
    ///
    /// Each accepted realtime connection gets its own handler task.
    pub async fn run(self) -> Result<(), QuillError> {
        let Self {
            http,
            transport,
            state,
        } = self;
        tracing::info!(
            http = ?http.local_addr().ok(),
            ws = ?transport.local_addr().ok(),
            "Quill server running"
        );

        let app = router(Arc::clone(&state));
        let serve_http = async move { axum::serve(http, app).await };
        tokio::select! {
            result = serve_http => result.map_err(QuillError::Io),
            () = accept_loop(transport, state) => Ok(()),
        }
    }
}

async fn accept_loop<S, R>(mut transport: WebSocketTransport, state: Arc<ServerState<S, R>>)
where
    S: UserStore,
    R: SessionRegistry,
{
    loop {
        match transport.accept().await {
            Ok(conn) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(conn, state).await {
                        tracing::debug!(error = %e, "connection ended with error");
                    }
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
            }
        }
    }
}
