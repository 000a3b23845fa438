use thiserror::Error;

/// Failures of the notification channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The reconnection budget is exhausted; the channel is closed and the
    /// session continues in degraded mode without push updates.
    #[error("notification channel unavailable after {attempts} failed attempts")]
    ChannelUnavailable { attempts: u32 },

    /// A WebSocket-level failure on connect or mid-stream.
    #[error("websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}
