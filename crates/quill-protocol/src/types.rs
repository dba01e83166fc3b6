//! Event types for Quill's realtime notification socket.
//!
//! Every frame is a JSON object with an `event` name and a `data` payload,
//! mirroring how browser socket clients name their events:
//!
//! ```text
//! {"event":"start","data":{"userId":"6f2c…"}}
//! {"event":"haveNotifications","data":true}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A user's identity as it appears on the wire and in token claims.
///
/// User ids are opaque strings (UUIDs for users created by this server).
/// `#[serde(transparent)]` keeps it a bare string in JSON.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper, returning the raw identifier.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Payload naming a user: `{"userId": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: UserId,
}

/// Payload of the `notificationsCount` reply: `{"count": 3}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsCount {
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Events a client sends over the notification socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Registers this connection as the live socket for `userId`.
    /// A later `start` for the same user (any connection) replaces it.
    Start(UserRef),

    /// Asks the server to poke `userId`'s live socket, if there is one.
    /// Sent by the actor after an action that produced a notification.
    Notify(UserRef),

    /// Asks for the number of unread notifications of `userId`.
    /// Answered with [`ServerEvent::NotificationsCount`].
    CheckNotifications(UserRef),

    /// Marks every notification of `userId` as read. No reply.
    ReadAll(UserRef),
}

impl ClientEvent {
    pub fn start(user_id: UserId) -> Self {
        Self::Start(UserRef { user_id })
    }

    pub fn notify(user_id: UserId) -> Self {
        Self::Notify(UserRef { user_id })
    }

    pub fn check_notifications(user_id: UserId) -> Self {
        Self::CheckNotifications(UserRef { user_id })
    }

    pub fn read_all(user_id: UserId) -> Self {
        Self::ReadAll(UserRef { user_id })
    }

    /// The event name as it appears on the wire, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Notify(_) => "notify",
            Self::CheckNotifications(_) => "checkNotifications",
            Self::ReadAll(_) => "readAll",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Events the server pushes to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Something new landed in the user's notification list.
    /// Always carries `true`; the client re-checks the count on receipt.
    HaveNotifications(bool),

    /// Reply to `checkNotifications`.
    NotificationsCount(NotificationsCount),

    /// The last frame could not be understood.
    Error { code: u16, message: String },
}

impl ServerEvent {
    pub fn notifications_count(count: usize) -> Self {
        Self::NotificationsCount(NotificationsCount { count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_serializes_as_bare_string() {
        let json = serde_json::to_string(&UserId::from("abc")).unwrap();
        assert_eq!(json, r#""abc""#);
    }

    #[test]
    fn test_user_id_display_is_raw_id() {
        assert_eq!(UserId::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_client_event_wire_names_are_camel_case() {
        let json = serde_json::to_value(ClientEvent::check_notifications(
            UserId::from("u"),
        ))
        .unwrap();
        assert_eq!(json["event"], "checkNotifications");
        assert_eq!(json["data"]["userId"], "u");

        let json =
            serde_json::to_value(ClientEvent::read_all(UserId::from("u")))
                .unwrap();
        assert_eq!(json["event"], "readAll");
    }

    #[test]
    fn test_client_event_name_matches_wire_tag() {
        for event in [
            ClientEvent::start(UserId::from("u")),
            ClientEvent::notify(UserId::from("u")),
            ClientEvent::check_notifications(UserId::from("u")),
            ClientEvent::read_all(UserId::from("u")),
        ] {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], event.name());
        }
    }

    #[test]
    fn test_have_notifications_carries_true() {
        let json =
            serde_json::to_string(&ServerEvent::HaveNotifications(true))
                .unwrap();
        assert_eq!(json, r#"{"event":"haveNotifications","data":true}"#);
    }

    #[test]
    fn test_error_event_has_code_and_message() {
        let json = serde_json::to_value(ServerEvent::Error {
            code: 400,
            message: "bad frame".into(),
        })
        .unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["data"]["code"], 400);
        assert_eq!(json["data"]["message"], "bad frame");
    }
}
