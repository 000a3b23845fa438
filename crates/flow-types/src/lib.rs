//! Shared types and constants for the flow client.
//!
//! This crate provides the foundational types used across all flow crates:
//! the post data model, viewer identity, the `AuthGate` collaborator
//! boundary, and the notification event types delivered over the push
//! channel.
//!
//! No crate in the workspace depends on anything *except* `flow-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod event;
pub use event::{EventPayload, NotificationEvent};

/// Maximum length of a post title, in characters.
pub const MAX_TITLE_CHARS: usize = 255;

/// Maximum length of a post body, in characters.
pub const MAX_CONTENT_CHARS: usize = 65_535;

/// Opaque viewer identity issued by the external identity provider.
///
/// The client never inspects or derives anything from the inner string; it
/// is captured at call time and forwarded verbatim in request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewerId(String);

impl ViewerId {
    /// Wraps a raw identity string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ViewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque server-assigned post identity.
///
/// The backend serializes post IDs as JSON integers, so the newtype wraps
/// an `i64` but exposes no arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ContentId(pub i64);

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A post as rendered in the feed.
///
/// Loaded read-only from the backend; `likes` and `viewer_has_liked` are the
/// only fields mutated client-side, and only through the engagement layer
/// pending server confirmation. Wire field names follow the backend feed
/// response (`content_id`, `user_id`, `username`, `likes`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Server-assigned unique post ID.
    pub content_id: ContentId,
    /// Identity of the author; `None` for anonymous legacy rows.
    #[serde(rename = "user_id")]
    pub author_id: Option<ViewerId>,
    /// Display name of the author.
    #[serde(rename = "username")]
    pub author_name: String,
    /// Post title, 1..=255 characters.
    pub title: String,
    /// Post body, 1..=65535 characters.
    pub content: String,
    /// Creation timestamp, server-assigned.
    pub created_at: DateTime<Utc>,
    /// Ordered, duplicate-free tag list.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Total like count. Non-negative by type.
    #[serde(rename = "likes")]
    pub like_count: u64,
    /// Whether the requesting viewer has liked this post.
    #[serde(default)]
    pub viewer_has_liked: bool,
}

/// A submission request for a new post.
///
/// Built by the composer once validation passes and the viewer identity is
/// known. The identity travels in the body under the backend's historical
/// `auth_id` field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    #[serde(rename = "auth_id")]
    pub author_id: ViewerId,
}

/// External collaborator boundary supplying the viewer identity.
///
/// Implemented outside this workspace (the surrounding app owns sign-in UI
/// and token storage). Identity resolution may itself be asynchronous:
/// `is_ready` distinguishes "not yet resolved" from "resolved to anonymous",
/// and callers must treat the two differently.
pub trait AuthGate: Send + Sync {
    /// Returns the current viewer identity, or `None` when signed out.
    fn current_identity(&self) -> Option<ViewerId>;

    /// Opens the external sign-in UI. Fire-and-forget.
    fn prompt_login(&self);

    /// Whether identity resolution has completed.
    fn is_ready(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_wire_field_names() {
        let post = Post {
            content_id: ContentId(7),
            author_id: Some(ViewerId::new("u1")),
            author_name: "User1".to_string(),
            title: "Title".to_string(),
            content: "Body".to_string(),
            created_at: "2026-01-01T00:00:00Z".parse().expect("valid timestamp"),
            tags: vec!["rust".to_string()],
            like_count: 5,
            viewer_has_liked: true,
        };

        let json = serde_json::to_value(&post).expect("serialization should not fail");
        assert_eq!(json["content_id"], 7);
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["username"], "User1");
        assert_eq!(json["likes"], 5);
        assert_eq!(json["viewer_has_liked"], true);
        assert!(json.get("author_id").is_none());
        assert!(json.get("like_count").is_none());
    }

    #[test]
    fn post_defaults_for_missing_optional_fields() {
        // Legacy rows carry neither tags nor the per-viewer like flag.
        let json = r#"{
            "content_id": 1,
            "user_id": null,
            "username": "legacy",
            "title": "t",
            "content": "c",
            "created_at": "2024-05-01T12:00:00Z",
            "likes": 0
        }"#;

        let post: Post = serde_json::from_str(json).expect("deserialization should not fail");
        assert_eq!(post.author_id, None);
        assert!(post.tags.is_empty());
        assert!(!post.viewer_has_liked);
    }

    #[test]
    fn new_post_uses_auth_id_field() {
        let req = NewPost {
            title: "Hi".to_string(),
            content: "World".to_string(),
            tags: vec![],
            author_id: ViewerId::new("u1"),
        };

        let json = serde_json::to_value(&req).expect("serialization should not fail");
        assert_eq!(json["auth_id"], "u1");
        assert!(json.get("author_id").is_none());
    }

    #[test]
    fn viewer_id_is_transparent() {
        let id: ViewerId = serde_json::from_str("\"abc\"").expect("should parse a bare string");
        assert_eq!(id.as_str(), "abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
