//! Transport seam for the notification channel.
//!
//! [`Transport`] separates connection plumbing from event semantics: the
//! channel state machine only ever sees a stream of raw text frames. The
//! production implementation is [`WsTransport`] over tokio-tungstenite;
//! tests script their own.

use crate::error::ChannelError;
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// A source of inbound notification frames.
///
/// `connect` is called once per connection attempt. The returned receiver
/// yields text frames until the connection ends, at which point it closes.
/// The channel never sends outbound frames.
pub trait Transport: Send + Sync + 'static {
    fn connect(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<String>, ChannelError>> + Send;
}

/// WebSocket transport for the backend notification endpoint.
#[derive(Debug, Clone)]
pub struct WsTransport {
    url: String,
}

impl WsTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Transport for WsTransport {
    fn connect(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<String>, ChannelError>> + Send {
        let url = self.url.clone();
        async move {
            let (stream, _) = connect_async(url.as_str()).await?;
            tracing::debug!(url = %url, "websocket connected");

            let (mut sink, mut source) = stream.split();
            let (tx, rx) = mpsc::channel(64);
            // The reader owns the socket halves. On every exit path `tx`
            // drops, closing the receiver and signalling the state machine
            // that the connection is gone.
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        // All receivers are gone (channel shutdown or handle
                        // drop); close the socket rather than lingering on a
                        // silent connection.
                        () = tx.closed() => {
                            let _ = sink.close().await;
                            return;
                        }
                        message = source.next() => match message {
                            Some(Ok(Message::Text(text))) => {
                                if tx.send(text.as_str().to_owned()).await.is_err() {
                                    let _ = sink.close().await;
                                    return;
                                }
                            }
                            Some(Ok(Message::Ping(payload))) => {
                                if sink.send(Message::Pong(payload)).await.is_err() {
                                    return;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => return,
                            Some(Err(err)) => {
                                tracing::debug!(error = %err, "websocket read failed");
                                return;
                            }
                            Some(Ok(_)) => {}
                        },
                    }
                }
            });
            Ok(rx)
        }
    }
}
