//! Connection Status Handle
//!
//! Shared, thread-safe view of the feed connection's state and counters.
//! The client owns the transitions; the HTTP surface and tests only read.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Lifecycle state of the single feed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport; a reconnect may be pending.
    #[default]
    Disconnected,
    /// Connect attempt in flight.
    Connecting,
    /// Transport established; frames may arrive.
    Open,
    /// Manual close in progress.
    Closing,
}

impl ConnectionState {
    /// Whether the transport is currently established.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Shared status handle for the feed connection.
#[derive(Debug, Default)]
pub struct FeedStatus {
    state: parking_lot::RwLock<ConnectionState>,
    ever_attempted: AtomicBool,
    last_connected_at: parking_lot::RwLock<Option<DateTime<Utc>>>,
    messages_received: AtomicU64,
    frames_dropped: AtomicU64,
    reconnect_attempts: AtomicU64,
}

impl FeedStatus {
    /// Create a fresh status handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a state transition.
    pub fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
        match state {
            ConnectionState::Connecting => {
                self.ever_attempted.store(true, Ordering::Relaxed);
            }
            ConnectionState::Open => {
                *self.last_connected_at.write() = Some(Utc::now());
            }
            ConnectionState::Disconnected | ConnectionState::Closing => {}
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Status query string for external consumers.
    ///
    /// One of `connecting`, `open`, `closed`, or `not_initialized`; derived
    /// purely from the connection state and whether a connect attempt has
    /// ever been made.
    #[must_use]
    pub fn query(&self) -> &'static str {
        if !self.ever_attempted.load(Ordering::Relaxed) {
            return "not_initialized";
        }
        match self.state() {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Disconnected | ConnectionState::Closing => "closed",
        }
    }

    /// Instant of the most recent successful open, if any.
    #[must_use]
    pub fn last_connected_at(&self) -> Option<DateTime<Utc>> {
        *self.last_connected_at.read()
    }

    /// Count one decoded frame.
    pub fn record_message(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one dropped (malformed) frame.
    pub fn record_dropped_frame(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one scheduled reconnect attempt.
    pub fn record_reconnect_attempt(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Total decoded frames.
    #[must_use]
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Total dropped frames.
    #[must_use]
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    /// Total scheduled reconnect attempts.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u64 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }
}
