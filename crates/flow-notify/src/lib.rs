//! Push notification channel for the flow client.
//!
//! Maintains one long-lived connection to the backend notification
//! endpoint per session, parses inbound frames into
//! [`NotificationEvent`]s and fans them out to subscribers in receipt
//! order. Connection health runs a `Connecting -> Open -> {Closed |
//! Reconnecting}` state machine with bounded exponential backoff; when the
//! retry budget is exhausted the channel closes as unavailable and the
//! session continues without push updates.

use flow_types::{EventPayload, NotificationEvent};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

mod error;
mod transport;

pub use error::ChannelError;
pub use transport::{Transport, WsTransport};

/// Connection phase of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    /// A connection attempt is in progress.
    Connecting,
    /// Connected; events are flowing.
    Open,
    /// The connection was lost or refused; a retry is scheduled.
    Reconnecting,
    /// Terminal. `unavailable` distinguishes an exhausted retry budget
    /// from a requested shutdown.
    Closed { unavailable: bool },
}

/// Observable channel state, published on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelState {
    pub status: ChannelStatus,
    /// Consecutive failures since the last successful connection.
    pub retry_count: u32,
    pub last_error: Option<String>,
}

/// Reconnection behavior: delay `base * 2^(n-1)` after the n-th
/// consecutive failure, capped at `max_delay`; give up for good after
/// `max_retries` consecutive failures.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_retries: 5,
        }
    }
}

fn backoff_delay(policy: &ReconnectPolicy, failures: u32) -> Duration {
    let exp = failures.saturating_sub(1).min(16);
    policy
        .base_delay
        .saturating_mul(1u32 << exp)
        .min(policy.max_delay)
}

/// Handle to a running notification channel.
///
/// Acquired once per session. [`NotificationChannel::shutdown`] stops the
/// channel cooperatively; dropping the handle releases the background task
/// as well, so the connection can never outlive its session.
pub struct NotificationChannel {
    events: broadcast::Sender<NotificationEvent>,
    state: watch::Receiver<ChannelState>,
    shutdown: watch::Sender<bool>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl NotificationChannel {
    /// Spawns the channel task and starts connecting immediately.
    pub fn open<T: Transport>(transport: T, policy: ReconnectPolicy) -> Self {
        let (events, _) = broadcast::channel(256);
        let (state_tx, state_rx) = watch::channel(ChannelState {
            status: ChannelStatus::Connecting,
            retry_count: 0,
            last_error: None,
        });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let runner = Runner {
            transport,
            policy,
            events: events.clone(),
            state: state_tx,
            shutdown: shutdown_rx,
        };
        let task = tokio::spawn(runner.run());

        Self {
            events,
            state: state_rx,
            shutdown: shutdown_tx,
            task: std::sync::Mutex::new(Some(task)),
        }
    }

    /// Subscribes to the event stream. Events are delivered in receipt
    /// order; a slow subscriber that falls behind misses the oldest events.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }

    /// A watch over the channel state, updated on every transition.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// The current channel state.
    pub fn state(&self) -> ChannelState {
        self.state.borrow().clone()
    }

    /// Stops the channel and waits for the task to finish.
    ///
    /// Suppresses any pending reconnection; the final state is
    /// `Closed { unavailable: false }` regardless of where the state
    /// machine was interrupted.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let task = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl Drop for NotificationChannel {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Ok(mut guard) = self.task.lock() {
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
    }
}

struct Runner<T> {
    transport: T,
    policy: ReconnectPolicy,
    events: broadcast::Sender<NotificationEvent>,
    state: watch::Sender<ChannelState>,
    shutdown: watch::Receiver<bool>,
}

impl<T: Transport> Runner<T> {
    fn publish(&self, status: ChannelStatus, retry_count: u32, last_error: Option<String>) {
        let _ = self.state.send(ChannelState {
            status,
            retry_count,
            last_error,
        });
    }

    fn close_requested(&self) {
        self.publish(ChannelStatus::Closed { unavailable: false }, 0, None);
    }

    async fn run(mut self) {
        let mut failures: u32 = 0;
        loop {
            if *self.shutdown.borrow() {
                self.close_requested();
                return;
            }

            self.publish(ChannelStatus::Connecting, failures, None);
            match self.transport.connect().await {
                Ok(frames) => {
                    failures = 0;
                    tracing::info!("notification channel open");
                    self.publish(ChannelStatus::Open, 0, None);
                    if self.pump(frames).await {
                        self.close_requested();
                        return;
                    }
                    // A lost connection counts as one failure toward the
                    // retry budget; a successful reconnect resets it.
                    failures = 1;
                    tracing::warn!("notification connection lost, reconnecting");
                    self.publish(
                        ChannelStatus::Reconnecting,
                        failures,
                        Some("connection closed".to_string()),
                    );
                }
                Err(err) => {
                    failures += 1;
                    if failures >= self.policy.max_retries {
                        let unavailable = ChannelError::ChannelUnavailable { attempts: failures };
                        tracing::error!(error = %err, attempts = failures, "notification channel unavailable");
                        self.publish(
                            ChannelStatus::Closed { unavailable: true },
                            failures,
                            Some(unavailable.to_string()),
                        );
                        return;
                    }
                    tracing::warn!(error = %err, attempt = failures, "notification connect failed");
                    self.publish(ChannelStatus::Reconnecting, failures, Some(err.to_string()));
                }
            }

            let delay = backoff_delay(&self.policy, failures);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        self.close_requested();
                        return;
                    }
                }
            }
        }
    }

    /// Forwards frames until the connection ends. Returns whether shutdown
    /// was requested.
    async fn pump(&mut self, mut frames: mpsc::Receiver<String>) -> bool {
        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        return true;
                    }
                }
                frame = frames.recv() => {
                    let Some(text) = frame else { return false };
                    match serde_json::from_str::<EventPayload>(&text) {
                        Ok(payload) => {
                            let event = NotificationEvent {
                                payload,
                                received_at: chrono::Utc::now(),
                            };
                            tracing::debug!(kind = event.payload.kind(), "notification received");
                            let _ = self.events.send(event);
                        }
                        // Unknown or malformed frames are dropped; the
                        // channel stays up.
                        Err(err) => {
                            tracing::warn!(error = %err, "dropping malformed notification frame");
                        }
                    }
                }
            }
        }
    }
}
