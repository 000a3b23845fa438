//! Optimistic like/unlike toggles with server reconciliation.
//!
//! The controller applies the requested state to the post immediately, then
//! confirms it with the backend. On failure the previous state is restored
//! and a non-fatal notice surfaced. Transitions for the same post are
//! serialized: at most one request per `content_id` is in flight, and a
//! toggle arriving while one is pending supersedes it
//! (last-requested-state-wins). Transitions for different posts are
//! independent.

use crate::api::FeedApi;
use crate::error::FeedError;
use crate::store::FeedStore;
use flow_types::{AuthGate, ContentId, ViewerId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A post's liked flag and count at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub count: u64,
}

/// Lifecycle of an in-flight optimistic mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStatus {
    /// Awaiting backend confirmation.
    Pending,
    /// Confirmed; the optimistic state is authoritative.
    Confirmed,
    /// Rejected; the previous state was restored.
    RolledBack,
}

/// Ephemeral record of an in-flight like mutation.
///
/// Owned exclusively by the controller and discarded once the status
/// leaves `Pending`.
#[derive(Debug, Clone)]
pub struct LikeTransition {
    pub content_id: ContentId,
    /// Baseline to restore on rollback. Advances when a superseded request
    /// is confirmed mid-sequence.
    pub previous: LikeState,
    /// The state last requested by the user.
    pub requested_liked: bool,
    pub status: TransitionStatus,
}

/// The expected count once `liked` is confirmed against `previous`.
fn optimistic_count(previous: LikeState, liked: bool) -> u64 {
    if liked == previous.liked {
        previous.count
    } else if liked {
        previous.count + 1
    } else {
        previous.count.saturating_sub(1)
    }
}

/// Toggles per-post like state against the feed store and backend.
pub struct EngagementController<A: FeedApi> {
    api: Arc<A>,
    store: Arc<FeedStore<A>>,
    auth: Arc<dyn AuthGate>,
    pending: Mutex<HashMap<ContentId, LikeTransition>>,
}

impl<A: FeedApi> EngagementController<A> {
    pub fn new(api: Arc<A>, store: Arc<FeedStore<A>>, auth: Arc<dyn AuthGate>) -> Self {
        Self {
            api,
            store,
            auth,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Toggles the viewer's like on a post.
    ///
    /// Without a viewer identity this never mutates state: it triggers the
    /// external login prompt (exactly once per call) and returns.
    ///
    /// The first call for a post becomes the driver: it issues requests
    /// until the confirmed state matches the last requested state. Calls
    /// arriving while a transition is pending only flip `requested_liked`
    /// and re-apply the optimistic view, then return immediately.
    pub async fn toggle_like(
        &self,
        content_id: ContentId,
        viewer: Option<ViewerId>,
    ) -> Result<(), FeedError> {
        let Some(viewer) = viewer else {
            tracing::debug!(%content_id, "like toggle without identity; prompting login");
            self.auth.prompt_login();
            return Ok(());
        };

        {
            let mut pending = self.pending.lock().await;
            if let Some(transition) = pending.get_mut(&content_id) {
                // Supersede the pending toggle: last requested state wins.
                let next = !transition.requested_liked;
                transition.requested_liked = next;
                let count = optimistic_count(transition.previous, next);
                self.store.apply_like_state(content_id, next, count).await;
                tracing::debug!(%content_id, requested = next, "superseded pending like transition");
                return Ok(());
            }

            let Some((liked, count)) = self.store.like_state(content_id).await else {
                tracing::warn!(%content_id, "like toggle for unknown post ignored");
                return Ok(());
            };
            let previous = LikeState { liked, count };
            let requested = !liked;
            pending.insert(
                content_id,
                LikeTransition {
                    content_id,
                    previous,
                    requested_liked: requested,
                    status: TransitionStatus::Pending,
                },
            );
            // Optimistic update: the UI reflects the requested state before
            // any server response.
            self.store
                .apply_like_state(content_id, requested, optimistic_count(previous, requested))
                .await;
        }

        self.drive(content_id, viewer).await
    }

    /// Issues requests for a post until converged on the last requested
    /// state, then discards the transition.
    async fn drive(&self, content_id: ContentId, viewer: ViewerId) -> Result<(), FeedError> {
        loop {
            let requested = {
                let pending = self.pending.lock().await;
                match pending.get(&content_id) {
                    Some(transition) => transition.requested_liked,
                    None => return Ok(()),
                }
            };

            match self.api.set_like(content_id, viewer.clone(), requested).await {
                Ok(()) => {
                    let mut pending = self.pending.lock().await;
                    let Some(transition) = pending.get_mut(&content_id) else {
                        return Ok(());
                    };
                    if transition.requested_liked == requested {
                        transition.status = TransitionStatus::Confirmed;
                        pending.remove(&content_id);
                        return Ok(());
                    }
                    // Superseded while in flight: the confirmed state is the
                    // new rollback baseline; loop for the follow-up request.
                    transition.previous = LikeState {
                        liked: requested,
                        count: optimistic_count(transition.previous, requested),
                    };
                }
                Err(err) => {
                    let mut pending = self.pending.lock().await;
                    if let Some(mut transition) = pending.remove(&content_id) {
                        transition.status = TransitionStatus::RolledBack;
                        self.store
                            .apply_like_state(
                                content_id,
                                transition.previous.liked,
                                transition.previous.count,
                            )
                            .await;
                    }
                    tracing::warn!(
                        %content_id,
                        error = %err,
                        "like sync failed; optimistic state rolled back"
                    );
                    return Err(FeedError::LikeSyncFailed {
                        content_id,
                        source: err,
                    });
                }
            }
        }
    }
}
