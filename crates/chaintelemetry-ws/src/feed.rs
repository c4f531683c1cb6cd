//! `BlockFeed` — polls a node's WebSocket endpoint for the latest block.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use chaintelemetry_core::policy::{RetryConfig, RetryPolicy};
use chaintelemetry_core::request::JsonRpcRequest;
use chaintelemetry_core::RawBlock;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const POLL_ID: u64 = 1;

/// Configuration for the block feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Time between two latest-block requests.
    pub poll_interval: Duration,
    /// Reconnect budget and backoff.
    pub reconnect: RetryConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1_000),
            reconnect: RetryConfig::default(),
        }
    }
}

/// Connection state of the feed.
///
/// `Closed` and `Failed` are published whenever a connection or connect
/// attempt ends; the feed moves on to `Connecting` if it has budget left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// Not started yet.
    Disconnected,
    Connecting,
    Connected,
    /// The connection ended (server close, stream end or receiver dropped).
    Closed,
    /// The connect attempt or the connection errored.
    Failed,
}

#[derive(Debug, Error)]
pub enum FeedError {
    /// The frame is not valid JSON.
    #[error("malformed feed message: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The reply carries a `result` that is not a usable block.
    #[error("undecodable block: {0}")]
    Decode(#[source] serde_json::Error),

    /// The feed gave up reconnecting.
    #[error("block feed {url} gave up after {attempts} consecutive failures: {reason}")]
    Disconnected {
        url: String,
        attempts: u32,
        reason: String,
    },
}

/// How a connected session ended.
enum SessionEnd {
    /// Nobody is listening for blocks anymore.
    ReceiverGone,
    Closed(String),
    Failed(String),
}

/// Result of one connected session.
struct Session {
    end: SessionEnd,
    /// The node answered at least one poll with a well-formed reply.
    healthy: bool,
}

/// Decode one inbound text frame.
///
/// Returns `Ok(None)` for replies that carry no block (no `result`, or a
/// `null` result before the node has a head).
pub fn parse_feed_message(text: &str) -> Result<Option<RawBlock>, FeedError> {
    let mut value: Value = serde_json::from_str(text).map_err(FeedError::Malformed)?;
    match value.get_mut("result").map(Value::take) {
        None | Some(Value::Null) => Ok(None),
        Some(result) => RawBlock::from_value(result)
            .map(Some)
            .map_err(FeedError::Decode),
    }
}

/// Polling WebSocket block feed.
pub struct BlockFeed {
    url: String,
    config: FeedConfig,
    state: watch::Sender<FeedState>,
}

impl BlockFeed {
    pub fn new(url: impl Into<String>, config: FeedConfig) -> Self {
        let (state, _) = watch::channel(FeedState::Disconnected);
        Self {
            url: url.into(),
            config,
            state,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> FeedState {
        *self.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn watch_state(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: FeedState) {
        self.state.send_replace(state);
    }

    /// Connect and forward every decoded block to `blocks`.
    ///
    /// Returns `Ok(())` once the receiving side of `blocks` is dropped, or
    /// an error when the reconnect budget runs out. A connection only resets
    /// the failure count once the node has answered a poll, so a peer that
    /// accepts and immediately drops connections still exhausts the budget.
    pub async fn run(&self, blocks: mpsc::UnboundedSender<RawBlock>) -> Result<(), FeedError> {
        let policy = RetryPolicy::new(self.config.reconnect.clone());
        let mut failures = 0u32;

        loop {
            self.set_state(FeedState::Connecting);
            tracing::info!(url = %self.url, "connecting to block feed");

            let (reason, end_state) = match connect_async(self.url.as_str()).await {
                Err(e) => {
                    tracing::error!(url = %self.url, error = %e, "websocket connect failed");
                    (e.to_string(), FeedState::Failed)
                }
                Ok((ws, _)) => {
                    self.set_state(FeedState::Connected);
                    tracing::info!(url = %self.url, "websocket connected, collecting new blocks");

                    let session = self.session(ws, &blocks).await;
                    if session.healthy {
                        failures = 0;
                    }
                    match session.end {
                        SessionEnd::ReceiverGone => {
                            tracing::info!(url = %self.url, "block receiver dropped, closing feed");
                            self.set_state(FeedState::Closed);
                            return Ok(());
                        }
                        SessionEnd::Closed(reason) => {
                            tracing::warn!(url = %self.url, %reason, "websocket connection closed");
                            (reason, FeedState::Closed)
                        }
                        SessionEnd::Failed(reason) => {
                            tracing::error!(url = %self.url, %reason, "websocket connection error");
                            (reason, FeedState::Failed)
                        }
                    }
                }
            };

            self.set_state(end_state);
            failures += 1;
            match policy.next_delay(failures) {
                Some(delay) => {
                    tracing::warn!(
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        url = %self.url,
                        "reconnecting to block feed"
                    );
                    time::sleep(delay).await;
                }
                None => {
                    return Err(FeedError::Disconnected {
                        url: self.url.clone(),
                        attempts: failures,
                        reason,
                    });
                }
            }
        }
    }

    async fn session(&self, ws: WsStream, blocks: &mpsc::UnboundedSender<RawBlock>) -> Session {
        let mut healthy = false;
        let end = self.pump(ws, blocks, &mut healthy).await;
        Session { end, healthy }
    }

    async fn pump(
        &self,
        ws: WsStream,
        blocks: &mpsc::UnboundedSender<RawBlock>,
        healthy: &mut bool,
    ) -> SessionEnd {
        let Ok(poll) = serde_json::to_string(&JsonRpcRequest::latest_block(POLL_ID)) else {
            return SessionEnd::Failed("failed to encode poll request".into());
        };

        let (mut write, mut read) = ws.split();
        let mut ticker = time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if blocks.is_closed() {
                        return SessionEnd::ReceiverGone;
                    }
                    if let Err(e) = write.send(Message::Text(poll.clone())).await {
                        return SessionEnd::Failed(e.to_string());
                    }
                    tracing::trace!("requested latest block");
                }
                msg = read.next() => match msg {
                    None => return SessionEnd::Closed("stream ended".into()),
                    Some(Err(e)) => return SessionEnd::Failed(e.to_string()),
                    Some(Ok(Message::Text(text))) => match parse_feed_message(&text) {
                        Ok(Some(block)) => {
                            *healthy = true;
                            if blocks.send(block).is_err() {
                                return SessionEnd::ReceiverGone;
                            }
                        }
                        Ok(None) => {
                            *healthy = true;
                            tracing::trace!("reply without block");
                        }
                        Err(e) => tracing::warn!(error = %e, "skipping feed message"),
                    },
                    // Pings are answered by tungstenite on the next write.
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "closed by server".into());
                        return SessionEnd::Closed(reason);
                    }
                    Some(Ok(_)) => {}
                },
            }
        }
    }
}
