//! Backend API client for the feed and engagement endpoints.
//!
//! [`FeedApi`] is the seam between the stores and the transport; the
//! production implementation is [`HttpFeedApi`] over reqwest, and tests
//! substitute scripted implementations.

use crate::error::ApiError;
use flow_types::{ContentId, NewPost, Post, ViewerId};
use serde::Serialize;
use std::future::Future;

/// Request body for the feed retrieval endpoint.
///
/// The identity may be absent, yielding the generic/anonymous feed.
#[derive(Debug, Serialize)]
struct RetrieveRequest {
    #[serde(rename = "userId")]
    user_id: Option<ViewerId>,
}

/// Backend operations consumed by the feed and engagement layers.
///
/// Every method takes the viewer identity (where relevant) by value: the
/// caller captures it once at the call boundary, so a concurrent identity
/// change can never leak a stale or null identity into an in-flight
/// request.
pub trait FeedApi: Send + Sync + 'static {
    /// Fetches the feed for the given viewer, most-recent-first as ordered
    /// by the server.
    fn fetch_feed(
        &self,
        viewer: Option<ViewerId>,
    ) -> impl Future<Output = Result<Vec<Post>, ApiError>> + Send;

    /// Submits a new post; returns the created post on HTTP 201.
    fn submit_post(&self, post: NewPost) -> impl Future<Output = Result<Post, ApiError>> + Send;

    /// Creates (`liked = true`) or deletes (`liked = false`) the viewer's
    /// like on a post.
    fn set_like(
        &self,
        content_id: ContentId,
        viewer: ViewerId,
        liked: bool,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// HTTP implementation of [`FeedApi`] speaking the backend wire format.
#[derive(Debug, Clone)]
pub struct HttpFeedApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFeedApi {
    /// Creates a client for the given backend base URL (no trailing slash
    /// required).
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl FeedApi for HttpFeedApi {
    fn fetch_feed(
        &self,
        viewer: Option<ViewerId>,
    ) -> impl Future<Output = Result<Vec<Post>, ApiError>> + Send {
        let client = self.client.clone();
        let url = self.url("/api/retrieve");
        async move {
            let response = client
                .post(&url)
                .json(&RetrieveRequest { user_id: viewer })
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(ApiError::Status(response.status().as_u16()));
            }
            Ok(response.json::<Vec<Post>>().await?)
        }
    }

    fn submit_post(&self, post: NewPost) -> impl Future<Output = Result<Post, ApiError>> + Send {
        let client = self.client.clone();
        let url = self.url("/api/contents");
        async move {
            let response = client.post(&url).json(&post).send().await?;
            if !response.status().is_success() {
                return Err(ApiError::Status(response.status().as_u16()));
            }
            Ok(response.json::<Post>().await?)
        }
    }

    fn set_like(
        &self,
        content_id: ContentId,
        viewer: ViewerId,
        liked: bool,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        let client = self.client.clone();
        let url = self.url(&format!("/api/posts/{}/{}/like", content_id, viewer));
        async move {
            let request = if liked {
                client.post(&url)
            } else {
                client.delete(&url)
            };
            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(ApiError::Status(response.status().as_u16()));
            }
            Ok(())
        }
    }
}
