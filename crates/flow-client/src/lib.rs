//! Session wiring for the flow client.
//!
//! A [`Session`] owns one of everything a signed-in (or anonymous) client
//! needs: the feed store, the engagement controller, the post composer and
//! the notification channel, plus the external [`AuthGate`] collaborator.
//! Construction wires inbound notifications into the feed store so pushed
//! posts and like counts appear without a manual refresh.
//!
//! The viewer identity is read from the gate exactly once per user action
//! and passed by value into the layer below; nothing here re-reads shared
//! identity state mid-operation.

pub mod config;

use flow_compose::{ComposeError, ComposerState, Field, PostComposer};
use flow_feed::{EngagementController, FeedApi, FeedError, FeedStore};
use flow_notify::{ChannelState, NotificationChannel};
use flow_types::{AuthGate, ContentId, EventPayload, NotificationEvent, Post, ViewerId};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Errors surfaced by session-level operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Identity resolution has not completed yet. Distinct from signed-out:
    /// the viewer may well be signed in, so no login prompt is raised;
    /// retry once the gate reports ready.
    #[error("identity resolution is still in progress")]
    IdentityPending,
}

/// One client session: stores, composer, engagement and notifications.
pub struct Session<A: FeedApi> {
    id: Uuid,
    api: Arc<A>,
    auth: Arc<dyn AuthGate>,
    store: Arc<FeedStore<A>>,
    engagement: Arc<EngagementController<A>>,
    composer: Mutex<PostComposer>,
    channel: NotificationChannel,
    wiring: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<A: FeedApi> Session<A> {
    /// Builds a session around an API client, an identity gate and an
    /// already-open notification channel.
    pub fn new(api: Arc<A>, auth: Arc<dyn AuthGate>, channel: NotificationChannel) -> Self {
        let store = Arc::new(FeedStore::new(api.clone()));
        let engagement = Arc::new(EngagementController::new(
            api.clone(),
            store.clone(),
            auth.clone(),
        ));
        let wiring = spawn_wiring(store.clone(), channel.subscribe());

        let id = Uuid::new_v4();
        tracing::info!(session_id = %id, "session started");
        Self {
            id,
            api,
            auth,
            store,
            engagement,
            composer: Mutex::new(PostComposer::new()),
            channel,
            wiring: std::sync::Mutex::new(Some(wiring)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The current feed snapshot.
    pub async fn feed(&self) -> Arc<[Post]> {
        self.store.snapshot().await
    }

    /// Reloads the feed for whoever is signed in right now.
    ///
    /// The identity is captured here; a sign-in or sign-out that lands
    /// while the request is in flight affects the next refresh, not this
    /// one. On failure the previous feed stays on screen.
    pub async fn refresh_feed(&self) -> Result<Arc<[Post]>, FeedError> {
        if !self.auth.is_ready() {
            tracing::debug!("identity not yet resolved; loading the generic feed");
        }
        self.store.load_feed(self.auth.current_identity()).await
    }

    /// Toggles the viewer's like on a post, optimistically.
    ///
    /// While identity resolution is still pending this defers with
    /// [`SessionError::IdentityPending`] instead of treating the viewer as
    /// signed out, so no spurious login prompt is raised.
    pub async fn toggle_like(&self, content_id: ContentId) -> Result<(), SessionError> {
        if !self.auth.is_ready() {
            tracing::debug!(%content_id, "like toggle deferred; identity still resolving");
            return Err(SessionError::IdentityPending);
        }
        self.engagement
            .toggle_like(content_id, self.auth.current_identity())
            .await
            .map_err(SessionError::from)
    }

    /// Submits the current draft.
    ///
    /// Validation failures and a missing identity abort before any network
    /// traffic; signed-out submission additionally triggers the external
    /// login prompt, keeping the draft intact for after sign-in. An
    /// identity still being resolved defers with
    /// [`SessionError::IdentityPending`] and prompts nothing. On success
    /// the created post is prepended to the local feed.
    pub async fn submit_post(&self) -> Result<Post, SessionError> {
        if !self.auth.is_ready() {
            tracing::debug!("submission deferred; identity still resolving");
            return Err(SessionError::IdentityPending);
        }
        let viewer = self.auth.current_identity();
        let request = {
            let mut composer = self.composer.lock().await;
            match composer.begin_submit(viewer.as_ref()) {
                Ok(request) => request,
                Err(ComposeError::SignedOut) => {
                    tracing::info!("submission while signed out; prompting login");
                    self.auth.prompt_login();
                    return Err(ComposeError::SignedOut.into());
                }
                Err(err) => return Err(err.into()),
            }
        };

        match self.api.submit_post(request).await {
            Ok(post) => {
                self.composer.lock().await.submit_succeeded();
                tracing::info!(content_id = %post.content_id, "post submitted");
                self.store.prepend(post.clone()).await;
                Ok(post)
            }
            Err(err) => {
                self.composer.lock().await.submit_failed();
                tracing::warn!(error = %err, "post submission failed; draft retained");
                Err(FeedError::SubmissionFailed(err).into())
            }
        }
    }

    /// Updates a draft field.
    pub async fn update_field(&self, field: Field, value: &str) {
        self.composer.lock().await.update_field(field, value);
    }

    /// Captures highlighted text as a tag candidate; returns the trimmed
    /// candidate, if any.
    pub async fn capture_selection(&self, raw: &str) -> Option<String> {
        self.composer
            .lock()
            .await
            .capture_selection(raw)
            .map(str::to_owned)
    }

    /// Confirms the captured selection as a tag. Returns whether a new tag
    /// was added.
    pub async fn confirm_selected_tag(&self) -> bool {
        self.composer.lock().await.confirm_selected_tag()
    }

    /// Removes a pending tag from the draft.
    pub async fn remove_tag(&self, tag: &str) {
        self.composer.lock().await.remove_tag(tag);
    }

    /// Discards the draft.
    pub async fn cancel_draft(&self) {
        self.composer.lock().await.cancel();
    }

    pub async fn composer_state(&self) -> ComposerState {
        self.composer.lock().await.state()
    }

    /// The draft's pending tags, in confirmation order.
    pub async fn draft_tags(&self) -> Vec<String> {
        self.composer
            .lock()
            .await
            .draft()
            .pending_tags
            .as_slice()
            .to_vec()
    }

    /// Subscribes to raw notification events (already applied to the feed
    /// store by the session's own wiring).
    pub fn subscribe_events(&self) -> broadcast::Receiver<NotificationEvent> {
        self.channel.subscribe()
    }

    /// A watch over the notification channel state.
    pub fn watch_channel(&self) -> watch::Receiver<ChannelState> {
        self.channel.watch_state()
    }

    /// Shuts the session down: closes the notification channel and stops
    /// the wiring task.
    pub async fn shutdown(&self) {
        self.channel.shutdown().await;
        let wiring = self
            .wiring
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = wiring {
            task.abort();
            let _ = task.await;
        }
        tracing::info!(session_id = %self.id, "session shut down");
    }
}

impl<A: FeedApi> Drop for Session<A> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.wiring.lock() {
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
    }
}

/// Applies pushed events to the feed store in receipt order.
fn spawn_wiring<A: FeedApi>(
    store: Arc<FeedStore<A>>,
    mut events: broadcast::Receiver<NotificationEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match event.payload {
                    EventPayload::NewPost { post } => {
                        let content_id = post.content_id;
                        // Skipped when already present, so a client that
                        // just submitted does not see its own post twice.
                        if store.prepend(post).await {
                            tracing::debug!(%content_id, "post added from notification");
                        }
                    }
                    EventPayload::LikeUpdate { content_id, likes } => {
                        if !store.apply_like_count(content_id, likes).await {
                            tracing::debug!(%content_id, "like update for unknown post ignored");
                        }
                    }
                    EventPayload::System { message } => {
                        tracing::info!(message = %message, "system notification");
                    }
                },
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "notification wiring lagged; events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Identity gate with a settable identity.
///
/// Stands in for the platform identity provider in the binary and in
/// tests; real deployments implement [`AuthGate`] over their own sign-in
/// flow.
#[derive(Debug, Default)]
pub struct StaticAuthGate {
    identity: std::sync::RwLock<Option<ViewerId>>,
}

impl StaticAuthGate {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(id: impl Into<String>) -> Self {
        Self {
            identity: std::sync::RwLock::new(Some(ViewerId::new(id))),
        }
    }

    pub fn set_identity(&self, identity: Option<ViewerId>) {
        if let Ok(mut guard) = self.identity.write() {
            *guard = identity;
        }
    }
}

impl AuthGate for StaticAuthGate {
    fn current_identity(&self) -> Option<ViewerId> {
        self.identity
            .read()
            .map(|guard| guard.clone())
            .unwrap_or(None)
    }

    fn prompt_login(&self) {
        tracing::info!("sign-in required; open the identity provider flow");
    }

    fn is_ready(&self) -> bool {
        true
    }
}
