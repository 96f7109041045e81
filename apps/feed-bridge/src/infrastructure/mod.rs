//! Infrastructure Layer - Adapters and external integrations.

/// Upstream feed WebSocket client and codec.
pub mod feed;

/// Tick fan-out to live subscribers.
pub mod broadcast;

/// Latest-value tick cache.
pub mod store;

/// Configuration loading.
pub mod config;

/// HTTP endpoints: health, metrics, tick stream.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Tracing initialization.
pub mod telemetry;
