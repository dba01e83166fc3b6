//! Unified error type for the Quill server.

use quill_auth::{AuthError, StoreError};
use quill_protocol::ProtocolError;
use quill_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuillError {
    /// A transport-level error (bind, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Credential or token failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// User store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Environment configuration could not be read.
    #[error("invalid configuration: {0}")]
    Config(#[from] envy::Error),

    /// Binding or serving the HTTP listener failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
