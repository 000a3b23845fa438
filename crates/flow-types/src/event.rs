//! Notification event types delivered over the push channel.

use crate::{ContentId, Post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured notification payloads, one variant per event kind.
///
/// Inbound channel frames are JSON objects tagged with a `kind` field so
/// subscribers can exhaustively match each kind. Frames whose `kind` is
/// unknown fail to parse and are dropped by the channel, never delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventPayload {
    /// A new post was published.
    NewPost {
        /// The created post, as the backend would return it from the feed.
        post: Post,
    },

    /// A post's like count changed.
    LikeUpdate {
        /// The post whose count changed.
        content_id: ContentId,
        /// The new total like count.
        likes: u64,
    },

    /// A server-originated informational message.
    System {
        /// Human-readable message text.
        message: String,
    },
}

impl EventPayload {
    /// Returns the canonical kind string for this payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewPost { .. } => "newPost",
            Self::LikeUpdate { .. } => "likeUpdate",
            Self::System { .. } => "system",
        }
    }
}

/// A notification as delivered to subscribers.
///
/// Wraps the wire payload with the local receipt timestamp. Ephemeral:
/// consumed by subscribers, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    /// The parsed wire payload.
    pub payload: EventPayload,
    /// Local receipt time, so subscribers can compare and order events
    /// without reparsing.
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_kind_tags_round_trip() {
        let like = EventPayload::LikeUpdate {
            content_id: ContentId(3),
            likes: 12,
        };
        let json = serde_json::to_value(&like).expect("serialization should not fail");
        assert_eq!(json["kind"], "likeUpdate");
        assert_eq!(json["content_id"], 3);
        assert_eq!(json["likes"], 12);

        let back: EventPayload = serde_json::from_value(json).expect("round trip");
        assert_eq!(back, like);
    }

    #[test]
    fn system_payload_parses() {
        let parsed: EventPayload =
            serde_json::from_str(r#"{"kind":"system","message":"maintenance at noon"}"#)
                .expect("system frame should parse");
        assert_eq!(parsed.kind(), "system");
        match parsed {
            EventPayload::System { message } => assert_eq!(message, "maintenance at noon"),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn unknown_kind_fails_to_parse() {
        let result = serde_json::from_str::<EventPayload>(r#"{"kind":"presence","who":"u1"}"#);
        assert!(result.is_err(), "unknown kinds must not parse");
    }
}
