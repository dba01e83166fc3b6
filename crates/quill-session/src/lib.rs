//! Realtime session registry for Quill.
//!
//! This crate answers one question: "which live socket belongs to this
//! user right now?"
//!
//! 1. **Handles**: a [`ConnectionHandle`] is a connection id plus a way to
//!    push events to that connection.
//! 2. **Registry**: the [`SessionRegistry`] trait maps users to handles
//!    (last connect wins). [`LocalSessionRegistry`] is the in-process
//!    implementation built on [`SessionMap`].
//! 3. **Delivery**: the [`Notifier`] routes a `haveNotifications` poke to a
//!    user if they are online and silently drops it otherwise.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server handlers (above)  ← register on `start`, unregister on disconnect
//!     ↕
//! Session registry (this crate)  ← user → connection routing
//!     ↕
//! Protocol / transport (below)  ← UserId, ServerEvent, ConnectionId
//! ```

#![allow(async_fn_in_trait)]

mod map;
mod notifier;
mod registry;
mod session;

pub use map::SessionMap;
pub use notifier::Notifier;
pub use registry::{LocalSessionRegistry, SessionRegistry};
pub use session::ConnectionHandle;
