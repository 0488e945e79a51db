//! Persistent feed subscription task
//!
//! Maintains a long-lived WebSocket connection to the change feed and
//! reconnects automatically with exponential backoff. The session
//! re-fetches a snapshot when the task reports `Connected` after a
//! drop, so events missed while disconnected cannot be lost.

use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use super::message::{ClientMessage, ServerMessage};
use crate::models::ChangeEvent;

/// Commands sent to the feed task
#[derive(Debug, Clone)]
pub enum FeedCommand {
    /// Unsubscribe, close the socket, and exit
    Shutdown,
}

/// Events emitted by the feed task, in arrival order
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Subscription established (or re-established)
    Connected,
    /// A row changed on the server
    Change(ChangeEvent),
    /// Connection lost; reconnection will be attempted
    Disconnected,
    /// Error occurred
    Error(String),
}

/// Connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Not connected, not trying
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Subscribed and receiving events
    Subscribed,
}

/// Handle to control and monitor the feed task
pub struct FeedHandle {
    /// Send commands to the feed task
    pub command_tx: mpsc::Sender<FeedCommand>,
    /// Receive events from the feed task
    pub event_rx: mpsc::Receiver<FeedEvent>,
    /// Watch connection status
    pub status_rx: watch::Receiver<FeedStatus>,
}

/// Configuration for the feed subscription
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// WebSocket URL of the feed endpoint
    pub url: String,
    /// Table to subscribe to
    pub table: String,
    /// Session token forwarded in the subscribe message
    pub token: Option<String>,
    /// Initial reconnect delay
    pub initial_reconnect_delay: Duration,
    /// Maximum reconnect delay
    pub max_reconnect_delay: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            table: "bookmarks".to_string(),
            token: None,
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
        }
    }
}

/// Spawn the persistent feed task
///
/// Returns a handle to control and monitor the task. The task
/// reconnects on disconnection until it is told to shut down.
pub fn spawn_feed_task(config: FeedConfig) -> FeedHandle {
    let (command_tx, command_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::channel(64);
    let (status_tx, status_rx) = watch::channel(FeedStatus::Disconnected);

    tokio::spawn(feed_task_loop(config, command_rx, event_tx, status_tx));

    FeedHandle {
        command_tx,
        event_rx,
        status_rx,
    }
}

/// Main feed task loop with reconnection
async fn feed_task_loop(
    config: FeedConfig,
    mut command_rx: mpsc::Receiver<FeedCommand>,
    event_tx: mpsc::Sender<FeedEvent>,
    status_tx: watch::Sender<FeedStatus>,
) {
    let mut reconnect_delay = config.initial_reconnect_delay;

    loop {
        let _ = status_tx.send(FeedStatus::Connecting);

        match connect_and_listen(
            &config,
            &mut reconnect_delay,
            &mut command_rx,
            &event_tx,
            &status_tx,
        )
        .await
        {
            Ok(should_shutdown) => {
                if should_shutdown {
                    let _ = status_tx.send(FeedStatus::Disconnected);
                    break;
                }
            }
            Err(e) => {
                let _ = event_tx
                    .send(FeedEvent::Error(format!("feed connection error: {e}")))
                    .await;
            }
        }

        let _ = status_tx.send(FeedStatus::Disconnected);
        let _ = event_tx.send(FeedEvent::Disconnected).await;

        // Wait before reconnecting, but stay responsive to shutdown
        tokio::select! {
            _ = tokio::time::sleep(reconnect_delay) => {
                // Exponential backoff
                reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
            }
            cmd = command_rx.recv() => {
                if matches!(cmd, Some(FeedCommand::Shutdown) | None) {
                    break;
                }
            }
        }
    }
}

/// Connect, subscribe, and forward events until disconnection or shutdown
///
/// The backoff delay resets as soon as the subscription is
/// acknowledged, whether the connection later ends cleanly or
/// mid-stream. A failure on a healthy connection must not inherit the
/// doubled delay from earlier failed attempts.
async fn connect_and_listen(
    config: &FeedConfig,
    reconnect_delay: &mut Duration,
    command_rx: &mut mpsc::Receiver<FeedCommand>,
    event_tx: &mpsc::Sender<FeedEvent>,
    status_tx: &watch::Sender<FeedStatus>,
) -> Result<bool> {
    let (ws_stream, _) = connect_async(&config.url).await?;
    let (mut write, mut read) = ws_stream.split();

    let subscribe = ClientMessage::subscribe(&config.table, config.token.as_deref());
    write.send(Message::Text(subscribe.encode())).await?;

    wait_for_subscribed(&mut read).await?;
    debug!("subscribed to change feed for '{}'", config.table);
    *reconnect_delay = config.initial_reconnect_delay;

    let _ = status_tx.send(FeedStatus::Subscribed);
    let _ = event_tx.send(FeedEvent::Connected).await;

    loop {
        tokio::select! {
            cmd = command_rx.recv() => {
                match cmd {
                    Some(FeedCommand::Shutdown) | None => {
                        // Scoped acquisition: always unsubscribe on the way out
                        let bye = ClientMessage::unsubscribe(&config.table);
                        write.send(Message::Text(bye.encode())).await.ok();
                        write.close().await.ok();
                        return Ok(true);
                    }
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match ServerMessage::decode(&text) {
                            Ok(ServerMessage::Change { event }) => {
                                let _ = event_tx.send(FeedEvent::Change(event)).await;
                            }
                            Ok(ServerMessage::Error { message }) => {
                                let _ = event_tx.send(FeedEvent::Error(message)).await;
                            }
                            Ok(ServerMessage::Subscribed { .. }) => {}
                            Err(e) => {
                                warn!("dropping undecodable feed frame: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        write.send(Message::Pong(payload)).await?;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Ok(false);
                    }
                    Some(Err(e)) => {
                        return Err(e.into());
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Wait for the subscription acknowledgement
async fn wait_for_subscribed(
    read: &mut futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
) -> Result<()> {
    let timeout = Duration::from_secs(10);
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            anyhow::bail!("Timeout waiting for feed subscription. Check the feed server is running.");
        }

        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match ServerMessage::decode(&text) {
                            Ok(ServerMessage::Subscribed { .. }) => return Ok(()),
                            Ok(ServerMessage::Error { message }) => {
                                anyhow::bail!("Feed rejected subscription: {}", message);
                            }
                            _ => {}
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        anyhow::bail!("Feed server closed connection during handshake");
                    }
                    Some(Err(e)) => {
                        anyhow::bail!("Feed connection error: {}", e);
                    }
                    _ => {}
                }
            }
            _ = tokio::time::sleep(remaining) => {
                anyhow::bail!("Timeout waiting for feed subscription. Check the feed server is running.");
            }
        }
    }
}
