//! Codec trait and implementations for serializing/deserializing events.
//!
//! The realtime server only needs something that implements [`Codec`].
//! [`JsonCodec`] is what browsers speak; a binary codec could be slotted in
//! without touching the connection handler.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use quill_protocol::{Codec, JsonCodec, ServerEvent};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&ServerEvent::HaveNotifications(true)).unwrap();
/// assert_eq!(bytes, br#"{"event":"haveNotifications","data":true}"#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientEvent, ServerEvent, UserId};

    #[test]
    fn test_decode_start_event_reads_user_id() {
        let codec = JsonCodec;
        let event: ClientEvent = codec
            .decode(br#"{"event":"start","data":{"userId":"u-1"}}"#)
            .expect("should decode");
        assert_eq!(event, ClientEvent::start(UserId::from("u-1")));
    }

    #[test]
    fn test_decode_unknown_event_returns_decode_error() {
        let codec = JsonCodec;
        let result: Result<ClientEvent, _> =
            codec.decode(br#"{"event":"explode","data":{}}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let codec = JsonCodec;
        let result: Result<ClientEvent, _> = codec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_notifications_count_nests_count_under_data() {
        let codec = JsonCodec;
        let bytes = codec
            .encode(&ServerEvent::notifications_count(3))
            .expect("should encode");
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["event"], "notificationsCount");
        assert_eq!(value["data"]["count"], 3);
    }
}
