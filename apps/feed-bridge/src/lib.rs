#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access
    )
)]

//! Feed Bridge - Market Data Fan-Out
//!
//! Maintains a single persistent WebSocket connection to the upstream
//! market-data feed, decodes its compact binary tick protocol, and fans the
//! decoded ticks out to multiple downstream consumers.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: pure types and rules
//!   - `instrument`: catalogue and symbol resolution
//!   - `market_hours`: trading-window check
//!   - `tick`: tick records and stream events
//!
//! - **Infrastructure**: adapters and external integrations
//!   - `feed`: WebSocket client, codec, backoff, status
//!   - `store`: latest-value tick cache
//!   - `broadcast`: subscriber fan-out
//!   - `config`: environment settings and instrument file
//!   - `http`: health, metrics, and SSE stream endpoints
//!
//! # Data Flow
//!
//! ```text
//! Feed WS ──► FeedClient ──► TickCodec ──┬──► TickStore  ──► snapshot
//!                                        │
//!                                        └──► Broadcaster ──► SSE client 1
//!                                                         └─► SSE client N
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - core types with no I/O dependencies.
pub mod domain;

/// Infrastructure layer - adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::instrument::{ExchangeSegment, Instrument, InstrumentError, InstrumentTable};
pub use domain::market_hours::is_market_open;
pub use domain::tick::{FrameKind, StreamEvent, TickRecord};

// Feed client
pub use infrastructure::feed::{
    ConnectionState, FeedClient, FeedClientConfig, FeedClientError, FeedStatus, ReconnectConfig,
    ReconnectPolicy,
};

// Store and broadcast (for integration tests and embedding)
pub use infrastructure::broadcast::{Broadcaster, SinkClosed, SubscriptionId, TickSink};
pub use infrastructure::store::TickStore;

// Configuration
pub use infrastructure::config::{
    BridgeConfig, ConfigError, Credentials, ServerSettings, WebSocketSettings, load_instruments,
};

// HTTP server
pub use infrastructure::http::{HttpServer, HttpServerError, HttpServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::init as init_telemetry;
