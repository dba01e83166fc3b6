//! # Quill
//!
//! Backend for the Quill blog platform: a token-authenticated REST API and
//! a realtime socket that pokes users when they have new notifications.
//!
//! The sub-crates do the work; this crate wires them into a server:
//!
//! - [`quill_auth`]: registration, login, access/refresh tokens
//! - [`quill_session`]: which user is online on which connection
//! - [`quill_protocol`]: realtime events and REST bodies
//! - [`quill_transport`]: the WebSocket listener
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quill::prelude::*;
//!
//! # async fn start() -> Result<(), QuillError> {
//! let server = QuillServerBuilder::new(ServerConfig::new("change-me"))
//!     .build_in_memory()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod api;
mod config;
mod error;
mod handler;
mod routes;
mod server;

pub use api::ApiError;
pub use config::ServerConfig;
pub use error::QuillError;
pub use routes::{FollowResult, MarkedRead, NotificationList, Profile};
pub use server::{QuillServer, QuillServerBuilder};

/// Everything needed to start a server and talk to it.
pub mod prelude {
    pub use crate::{QuillError, QuillServer, QuillServerBuilder, ServerConfig};
    pub use quill_auth::{InMemoryUserStore, UserStore};
    pub use quill_protocol::{ClientEvent, ServerEvent, UserId};
    pub use quill_session::{LocalSessionRegistry, SessionRegistry};
}
