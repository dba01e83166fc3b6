//! Realtime wire protocol for Quill.
//!
//! This crate defines what travels over the notification socket:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`UserId`]): the events
//!   clients and the server exchange.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events are turned
//!   into frames and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//! - **REST bodies** ([`http`]): the auth endpoints' request/response
//!   shapes, shared with the client.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Session registry (user routing)
//! ```

mod codec;
mod error;
pub mod http;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientEvent, NotificationsCount, ServerEvent, UserId, UserRef};
