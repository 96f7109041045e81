//! Feed WebSocket Client
//!
//! Owns the single upstream connection's lifecycle: connect, subscribe on
//! open, route incoming frames into the store and broadcaster, and reconnect
//! with backoff when the transport closes.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected --connect--> Connecting --open--> Open
//!       ^                                          |
//!       +------------- close (backoff) ------------+
//! ```
//!
//! Every close schedules a reconnect after the current backoff delay; the
//! delay grows by 1.5x per attempt, capped at 60 s, and resets to 5 s after
//! the next successful open. Only [`FeedClient::stop`] ends the lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::domain::instrument::InstrumentTable;
use crate::domain::market_hours::is_market_open;
use crate::domain::tick::TickRecord;
use crate::infrastructure::broadcast::Broadcaster;
use crate::infrastructure::store::TickStore;

use super::codec::{self, CodecError};
use super::reconnect::{ReconnectConfig, ReconnectPolicy};
use super::status::{ConnectionState, FeedStatus};

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur in the feed client.
#[derive(Debug, thiserror::Error)]
pub enum FeedClientError {
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Failed to send a control message on the socket.
    #[error("failed to send request: {0}")]
    SendFailed(String),

    /// Outgoing request could not be encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Connection closed by the peer or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// Full WebSocket URL, credentials included as query parameters.
    pub url: String,
    /// Reconnection configuration.
    pub reconnect: ReconnectConfig,
}

impl FeedClientConfig {
    /// Create a new configuration with default reconnect behavior.
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            url,
            reconnect: ReconnectConfig::default(),
        }
    }

    /// URL with the credential query stripped, safe for logs.
    #[must_use]
    pub fn redacted_url(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}

// =============================================================================
// Feed Client
// =============================================================================

/// Client for the upstream tick feed.
///
/// One instance owns one logical connection. All frame handling runs
/// sequentially inside the read loop, so store and broadcaster mutations
/// need no extra serialization.
pub struct FeedClient {
    config: FeedClientConfig,
    table: Arc<InstrumentTable>,
    store: Arc<TickStore>,
    broadcaster: Arc<Broadcaster>,
    status: Arc<FeedStatus>,
    cancel: CancellationToken,
    running: AtomicBool,
}

impl FeedClient {
    /// Create a new feed client. No connection is attempted until
    /// [`Self::start`] or [`Self::run`] is called.
    #[must_use]
    pub fn new(
        config: FeedClientConfig,
        table: Arc<InstrumentTable>,
        store: Arc<TickStore>,
        broadcaster: Arc<Broadcaster>,
        status: Arc<FeedStatus>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            table,
            store,
            broadcaster,
            status,
            cancel,
            running: AtomicBool::new(false),
        }
    }

    /// The shared status handle.
    #[must_use]
    pub fn status(&self) -> Arc<FeedStatus> {
        Arc::clone(&self.status)
    }

    /// Spawn the connection loop on the current runtime.
    ///
    /// Returns `false` without spawning if the loop is already running:
    /// concurrent starts must not create a second transport.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("feed client already running, start ignored");
            return false;
        }
        let client = Arc::clone(self);
        tokio::spawn(client.run());
        true
    }

    /// Manually close the connection and stop the lifecycle.
    ///
    /// Cancels any pending reconnect; no further reconnect is scheduled.
    /// Terminal for this instance: create a new client to connect again.
    pub fn stop(&self) {
        self.status.set_state(ConnectionState::Closing);
        self.cancel.cancel();
    }

    /// Run the connection loop until cancelled.
    ///
    /// Connects, streams frames, and on any close schedules a reconnect
    /// after the current backoff delay. Returns only on manual stop.
    pub async fn run(self: Arc<Self>) {
        let mut policy = ReconnectPolicy::new(self.config.reconnect.clone());

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.status.set_state(ConnectionState::Connecting);
            match self.connect_and_stream(&mut policy).await {
                Ok(()) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "feed connection lost");
                }
            }
            self.status.set_state(ConnectionState::Disconnected);

            let delay = policy.next_delay();
            self.status.record_reconnect_attempt();
            metrics::counter!("feed_bridge_reconnects_total").increment(1);
            tracing::info!(
                attempt = policy.attempt_count(),
                delay_ms = delay.as_millis(),
                "scheduling reconnect"
            );

            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!("reconnect cancelled by manual stop");
                    break;
                }
                () = tokio::time::sleep(delay) => {}
            }
        }

        self.status.set_state(ConnectionState::Disconnected);
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("feed client stopped");
    }

    /// Connect, subscribe, and stream frames until close or cancellation.
    async fn connect_and_stream(
        &self,
        policy: &mut ReconnectPolicy,
    ) -> Result<(), FeedClientError> {
        tracing::info!(endpoint = %self.config.redacted_url(), "connecting to feed");

        let (ws_stream, _response) =
            tokio_tungstenite::connect_async(self.config.url.as_str()).await?;

        policy.reset();
        self.status.set_state(ConnectionState::Open);
        tracing::info!("feed connection open");

        let (mut write, mut read) = ws_stream.split();

        if is_market_open(Utc::now()) {
            self.send_subscriptions(&mut write).await?;
        } else {
            tracing::info!("market closed, skipping subscription; connection stays idle");
        }

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!("feed client cancelled");
                    return Ok(());
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Binary(payload))) => {
                            self.handle_frame(&payload);
                        }
                        Some(Ok(Message::Text(text))) => {
                            // The feed uses text frames for diagnostics only;
                            // they never reach the store or broadcaster.
                            tracing::debug!(message = %text.as_str(), "feed text message");
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "server sent close frame");
                            return Err(FeedClientError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            // An error alone never forces a reconnect; the
                            // transport's own close ends the stream.
                            tracing::warn!(error = %e, "feed transport error");
                        }
                        None => {
                            tracing::info!("feed stream ended");
                            return Err(FeedClientError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    /// Route one binary frame: decode, resolve, store, publish.
    ///
    /// Malformed frames are dropped with a diagnostic; the connection is
    /// unaffected either way.
    pub fn handle_frame(&self, payload: &[u8]) {
        match codec::decode_frame(payload) {
            Ok(frame) => {
                self.status.record_message();
                metrics::counter!("feed_bridge_frames_received_total").increment(1);

                let record = TickRecord {
                    security_id: frame.security_id,
                    symbol: self.table.resolve_symbol(frame.security_id),
                    price: frame.price,
                    timestamp: frame.epoch_seconds,
                    kind: frame.kind,
                };
                self.store.upsert(record.clone());
                self.broadcaster.publish(&record);
            }
            Err(e) => {
                self.status.record_dropped_frame();
                metrics::counter!("feed_bridge_frames_dropped_total").increment(1);
                tracing::warn!(error = %e, len = payload.len(), "dropping malformed frame");
            }
        }
    }

    /// Send every subscribe batch in catalogue order, then the mode-set.
    async fn send_subscriptions<W>(&self, write: &mut W) -> Result<(), FeedClientError>
    where
        W: SinkExt<Message> + Unpin,
        W::Error: std::fmt::Display,
    {
        let requests = codec::subscription_requests(self.table.all());
        let batches = requests.len().saturating_sub(1);

        for request in &requests {
            let json = request.to_json().map_err(CodecError::from)?;
            write
                .send(Message::Text(json.into()))
                .await
                .map_err(|e| FeedClientError::SendFailed(e.to_string()))?;
        }

        tracing::info!(
            instruments = self.table.len(),
            batches,
            "subscriptions sent"
        );
        Ok(())
    }
}

impl std::fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClient")
            .field("endpoint", &self.config.redacted_url())
            .field("state", &self.status.state())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::instrument::{ExchangeSegment, Instrument};
    use crate::domain::tick::{FrameKind, StreamEvent};

    fn test_client() -> (Arc<FeedClient>, Arc<TickStore>, Arc<Broadcaster>) {
        let table = Arc::new(
            InstrumentTable::new(vec![Instrument {
                symbol: "RELIANCE".to_string(),
                exchange_segment: ExchangeSegment::Equity,
                security_id: "2885".to_string(),
            }])
            .unwrap(),
        );
        let store = Arc::new(TickStore::new());
        let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&store)));

        let client = Arc::new(FeedClient::new(
            FeedClientConfig::new("ws://127.0.0.1:1/feed".to_string()),
            table,
            Arc::clone(&store),
            Arc::clone(&broadcaster),
            Arc::new(FeedStatus::new()),
            CancellationToken::new(),
        ));
        (client, store, broadcaster)
    }

    fn frame(kind: u8, security_id: u32, price: f32, epoch: u32) -> Vec<u8> {
        let mut buf = vec![0u8; 16];
        buf[0] = kind;
        buf[4..8].copy_from_slice(&security_id.to_le_bytes());
        buf[8..12].copy_from_slice(&price.to_le_bytes());
        buf[12..16].copy_from_slice(&epoch.to_le_bytes());
        buf
    }

    #[test]
    fn frame_routing_writes_store_and_publishes() {
        let (client, store, broadcaster) = test_client();
        let (tx, mut rx) = mpsc::channel(8);
        let _id = broadcaster.subscribe(Box::new(tx));

        client.handle_frame(&frame(0x02, 2885, 2456.5, 1_700_000_000));

        let record = store.get(2885).unwrap();
        assert_eq!(record.symbol, "RELIANCE");
        assert_eq!(record.kind, FrameKind::Ltp);
        assert_eq!(client.status().messages_received(), 1);

        let _ = rx.try_recv().unwrap(); // initial
        assert!(matches!(
            rx.try_recv().unwrap(),
            StreamEvent::Tick(r) if r.security_id == 2885
        ));
    }

    #[test]
    fn unknown_security_id_uses_placeholder() {
        let (client, store, _broadcaster) = test_client();

        client.handle_frame(&frame(0x06, 424_242, 1.25, 1_700_000_000));

        let record = store.get(424_242).unwrap();
        assert_eq!(record.symbol, "securityId:424242");
        assert_eq!(record.kind, FrameKind::Quote);
    }

    #[test]
    fn malformed_frame_is_dropped_without_side_effects() {
        let (client, store, _broadcaster) = test_client();

        client.handle_frame(&[0x02, 0x00, 0x01]);

        assert!(store.is_empty());
        assert_eq!(client.status().messages_received(), 0);
        assert_eq!(client.status().frames_dropped(), 1);
    }

    #[test]
    fn duplicate_ticks_keep_last_value() {
        let (client, store, _broadcaster) = test_client();

        client.handle_frame(&frame(0x02, 2885, 100.0, 1_700_000_000));
        client.handle_frame(&frame(0x02, 2885, 101.0, 1_700_000_060));

        assert_eq!(store.len(), 1);
        let record = store.get(2885).unwrap();
        assert_eq!(record.timestamp, 1_700_000_060);
    }

    #[test]
    fn redacted_url_drops_query() {
        let config =
            FeedClientConfig::new("wss://feed.example.com?version=2&token=secret".to_string());
        assert_eq!(config.redacted_url(), "wss://feed.example.com");
    }

    #[tokio::test]
    async fn start_is_idempotent_while_running() {
        let (client, _store, _broadcaster) = test_client();

        assert!(client.start());
        assert!(!client.start());

        client.stop();
    }

    #[tokio::test]
    async fn stop_before_start_leaves_client_uninitialized() {
        let (client, _store, _broadcaster) = test_client();
        client.stop();
        assert_eq!(client.status().query(), "not_initialized");
    }
}
