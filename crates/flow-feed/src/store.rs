//! In-memory feed store.
//!
//! Owns the post list and all mutations to it. Renderers receive immutable
//! `Arc<[Post]>` snapshots and never mutate state directly; the only
//! writers are [`FeedStore::load_feed`], the composer success path
//! ([`FeedStore::prepend`]), and the engagement layer's like-state hooks.

use crate::api::FeedApi;
use crate::error::FeedError;
use flow_types::{ContentId, Post, ViewerId};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Fetches and caches the feed for the current session.
pub struct FeedStore<A: FeedApi> {
    api: Arc<A>,
    posts: RwLock<Arc<[Post]>>,
}

impl<A: FeedApi> FeedStore<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            posts: RwLock::new(Vec::new().into()),
        }
    }

    /// Loads the feed for the given viewer identity.
    ///
    /// The identity is captured here, at the call boundary, and travels by
    /// value into the request; a concurrent identity change cannot affect
    /// an in-flight load. Server ordering is preserved as-is.
    ///
    /// On failure the previously displayed feed is left unchanged and
    /// [`FeedError::FeedLoadFailed`] is returned; the load is retried only
    /// on explicit user action or identity change. Concurrent loads are not
    /// de-duplicated: the last response to arrive wins.
    pub async fn load_feed(&self, viewer: Option<ViewerId>) -> Result<Arc<[Post]>, FeedError> {
        let fetched = self
            .api
            .fetch_feed(viewer)
            .await
            .map_err(FeedError::FeedLoadFailed)?;

        tracing::debug!(count = fetched.len(), "feed loaded");
        let snapshot: Arc<[Post]> = fetched.into();
        *self.posts.write().await = snapshot.clone();
        Ok(snapshot)
    }

    /// The current immutable snapshot.
    pub async fn snapshot(&self) -> Arc<[Post]> {
        self.posts.read().await.clone()
    }

    /// Prepends a post to the head of the feed.
    ///
    /// Used for freshly created posts (composer success, `newPost`
    /// notifications). Posts already present by `content_id` are skipped so
    /// the submitting client does not see its own post twice. Returns
    /// whether the post was inserted.
    pub async fn prepend(&self, post: Post) -> bool {
        let mut posts = self.posts.write().await;
        if posts.iter().any(|p| p.content_id == post.content_id) {
            return false;
        }
        let mut next = Vec::with_capacity(posts.len() + 1);
        next.push(post);
        next.extend(posts.iter().cloned());
        *posts = next.into();
        true
    }

    /// Reads a post's current `(viewer_has_liked, like_count)` pair.
    pub async fn like_state(&self, content_id: ContentId) -> Option<(bool, u64)> {
        self.posts
            .read()
            .await
            .iter()
            .find(|p| p.content_id == content_id)
            .map(|p| (p.viewer_has_liked, p.like_count))
    }

    /// Sets a post's like state. Engagement-layer use only.
    ///
    /// Returns whether the post was found.
    pub async fn apply_like_state(&self, content_id: ContentId, liked: bool, count: u64) -> bool {
        self.patch(content_id, |post| {
            post.viewer_has_liked = liked;
            post.like_count = count;
        })
        .await
    }

    /// Patches a post's total like count without touching the viewer's own
    /// flag. Used for `likeUpdate` notifications, which report other
    /// viewers' activity.
    pub async fn apply_like_count(&self, content_id: ContentId, count: u64) -> bool {
        self.patch(content_id, |post| post.like_count = count).await
    }

    async fn patch(&self, content_id: ContentId, f: impl FnOnce(&mut Post)) -> bool {
        let mut posts = self.posts.write().await;
        let mut next: Vec<Post> = posts.iter().cloned().collect();
        match next.iter_mut().find(|p| p.content_id == content_id) {
            Some(post) => {
                f(post);
                *posts = next.into();
                true
            }
            None => false,
        }
    }
}
