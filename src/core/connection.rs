//! Duplex WebSocket connection to the chat backend.
//!
//! Outbound messages go through a bounded channel to a writer half owned by a
//! single connection task; inbound frames are forwarded in transport order on
//! an unbounded channel. Pings are answered with pongs. When the server closes
//! the socket or the transport fails, [`ConnectionEvent::Closed`] is delivered
//! once and the task ends. There is no reconnection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::core::protocol::{ClientMessage, InboundFrame};

const WS_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The WebSocket handshake failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The connection task has ended
    #[error("Not connected")]
    NotConnected,
}

pub type ConnectionResult<T> = Result<T, ConnectionError>;

// =============================================================================
// Events
// =============================================================================

/// What the connection task reports to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Frame(InboundFrame),
    /// The socket is gone; carries the reason when there was an error.
    Closed(Option<String>),
}

#[derive(Debug)]
enum Outbound {
    Message(ClientMessage),
    Close,
}

// =============================================================================
// Handle
// =============================================================================

/// Sending half of a backend connection.
#[derive(Debug)]
pub struct BackendConnection {
    tx: mpsc::Sender<Outbound>,
    connected: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl BackendConnection {
    /// Open the socket and start the connection task.
    pub async fn connect(
        url: &str,
    ) -> ConnectionResult<(Self, mpsc::UnboundedReceiver<ConnectionEvent>)> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ConnectionError::ConnectionFailed(e.to_string()))?;

        tracing::info!("Connected to {url}");

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let (tx, mut rx) = mpsc::channel::<Outbound>(WS_CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let connected = Arc::new(AtomicBool::new(true));
        let task_connected = connected.clone();

        let task = tokio::spawn(async move {
            let mut close_reason = None;

            loop {
                tokio::select! {
                    outbound = rx.recv() => {
                        let message = match outbound {
                            Some(Outbound::Message(message)) => message,
                            Some(Outbound::Close) | None => {
                                if let Err(e) = ws_sink.send(Message::Close(None)).await {
                                    tracing::debug!("Failed to send close frame: {e}");
                                }
                                break;
                            }
                        };

                        if let Err(e) = ws_sink.send(Message::Text(message.encode().into())).await {
                            tracing::error!("Failed to send WebSocket message: {e}");
                            close_reason = Some(e.to_string());
                            break;
                        }
                    }

                    inbound = ws_stream.next() => {
                        let Some(msg) = inbound else {
                            tracing::info!("WebSocket stream ended");
                            break;
                        };
                        let frame = match msg {
                            Ok(Message::Text(text)) => InboundFrame::Structured(text.to_string()),
                            Ok(Message::Binary(data)) => InboundFrame::Audio(data),
                            Ok(Message::Close(_)) => {
                                tracing::info!("WebSocket closed by server");
                                break;
                            }
                            Ok(Message::Ping(data)) => {
                                if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                    tracing::error!("Failed to send pong: {e}");
                                }
                                continue;
                            }
                            Err(e) => {
                                tracing::error!("WebSocket error: {e}");
                                close_reason = Some(e.to_string());
                                break;
                            }
                            _ => continue,
                        };

                        if events_tx.send(ConnectionEvent::Frame(frame)).is_err() {
                            tracing::debug!("Connection listener gone");
                            break;
                        }
                    }
                }
            }

            task_connected.store(false, Ordering::SeqCst);
            let _ = events_tx.send(ConnectionEvent::Closed(close_reason));
        });

        Ok((
            Self {
                tx,
                connected,
                task,
            },
            events_rx,
        ))
    }

    /// Queue a message for the backend.
    pub async fn send(&self, message: ClientMessage) -> ConnectionResult<()> {
        if !self.is_connected() {
            return Err(ConnectionError::NotConnected);
        }
        self.tx
            .send(Outbound::Message(message))
            .await
            .map_err(|_| ConnectionError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send a close frame and wait for the connection task to end.
    pub async fn close(self) {
        let _ = self.tx.send(Outbound::Close).await;
        if let Err(e) = self.task.await {
            tracing::warn!("Connection task ended abnormally: {e}");
        }
    }
}
