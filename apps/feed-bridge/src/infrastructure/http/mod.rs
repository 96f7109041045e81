//! HTTP Surface
//!
//! HTTP endpoints for health checks, Prometheus metrics, and the live tick
//! stream. Used by container orchestrators and downstream consumers.
//!
//! # Endpoints
//!
//! - `GET /health` - JSON health status, including the feed status query
//! - `GET /healthz` - liveness probe (simple OK)
//! - `GET /readyz` - readiness probe (ready iff the feed connection is open)
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /stream` - server-sent events: one `initial` snapshot, then ticks

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::broadcast::Broadcaster;
use crate::infrastructure::feed::FeedStatus;
use crate::infrastructure::metrics::get_metrics_handle;
use crate::infrastructure::store::TickStore;

// =============================================================================
// Health Response Types
// =============================================================================

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Feed connection open, ticks can flow.
    Healthy,
    /// Process alive but the feed connection is not open.
    Degraded,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Feed status query: `connecting`, `open`, `closed`, `not_initialized`.
    pub connection: &'static str,
    /// Bridge version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Instant of the most recent successful feed open.
    pub last_connected_at: Option<DateTime<Utc>>,
    /// Binary frames decoded since startup.
    pub messages_received: u64,
    /// Malformed frames dropped since startup.
    pub frames_dropped: u64,
    /// Reconnect attempts scheduled since startup.
    pub reconnect_attempts: u64,
    /// Distinct instruments currently cached.
    pub instruments_cached: usize,
    /// Currently attached stream subscribers.
    pub subscribers: usize,
}

// =============================================================================
// Server State
// =============================================================================

/// Shared state for the HTTP server.
pub struct HttpServerState {
    version: String,
    started_at: Instant,
    status: Arc<FeedStatus>,
    store: Arc<TickStore>,
    broadcaster: Arc<Broadcaster>,
    stream_channel_capacity: usize,
}

impl HttpServerState {
    /// Create new server state.
    #[must_use]
    pub fn new(
        version: String,
        status: Arc<FeedStatus>,
        store: Arc<TickStore>,
        broadcaster: Arc<Broadcaster>,
        stream_channel_capacity: usize,
    ) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            status,
            store,
            broadcaster,
            stream_channel_capacity,
        }
    }
}

// =============================================================================
// Server
// =============================================================================

/// HTTP server for health, metrics, and the tick stream.
pub struct HttpServer {
    port: u16,
    state: Arc<HttpServerState>,
    cancel: CancellationToken,
}

impl HttpServer {
    /// Create a new HTTP server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HttpServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`HttpServerError`] if binding fails or the server encounters
    /// a fatal error while running.
    pub async fn run(self) -> Result<(), HttpServerError> {
        let app = Router::new()
            .route("/health", get(health_handler))
            .route("/healthz", get(liveness_handler))
            .route("/readyz", get(readiness_handler))
            .route("/metrics", get(metrics_handler))
            .route("/stream", get(stream_handler))
            .with_state(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HttpServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HttpServerError::ServerFailed(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HttpServerState>>) -> impl IntoResponse {
    Json(build_health_response(&state))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HttpServerState>>) -> impl IntoResponse {
    if state.status.state().is_open() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

/// Attach an SSE consumer to the broadcaster.
///
/// The subscriber's channel is bounded; if the consumer cannot keep up, the
/// broadcaster drops it on the next publish and the stream ends. A consumer
/// that disconnects is pruned the same way.
async fn stream_handler(
    State(state): State<Arc<HttpServerState>>,
) -> Sse<impl futures::Stream<Item = Result<Event, axum::Error>>> {
    let (tx, rx) = mpsc::channel(state.stream_channel_capacity);
    let subscription = state.broadcaster.subscribe(Box::new(tx));
    tracing::debug!(subscription, "stream subscriber attached");

    let stream = ReceiverStream::new(rx).map(|event| Event::default().json_data(&event));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn build_health_response(state: &HttpServerState) -> HealthResponse {
    let connection = state.status.query();
    let status = if state.status.state().is_open() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    HealthResponse {
        status,
        connection,
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        last_connected_at: state.status.last_connected_at(),
        messages_received: state.status.messages_received(),
        frames_dropped: state.status.frames_dropped(),
        reconnect_attempts: state.status.reconnect_attempts(),
        instruments_cached: state.store.len(),
        subscribers: state.broadcaster.subscriber_count(),
    }
}

// =============================================================================
// Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::infrastructure::feed::ConnectionState;

    use super::*;

    fn test_state() -> HttpServerState {
        let store = Arc::new(TickStore::new());
        HttpServerState::new(
            "test-0.0.1".to_string(),
            Arc::new(FeedStatus::new()),
            Arc::clone(&store),
            Arc::new(Broadcaster::new(store)),
            64,
        )
    }

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }

    #[test]
    fn fresh_bridge_reports_degraded_and_uninitialized() {
        let state = test_state();
        let response = build_health_response(&state);

        assert_eq!(response.status, HealthStatus::Degraded);
        assert_eq!(response.connection, "not_initialized");
        assert_eq!(response.subscribers, 0);
        assert_eq!(response.instruments_cached, 0);
    }

    #[test]
    fn open_feed_reports_healthy() {
        let state = test_state();
        state.status.set_state(ConnectionState::Connecting);
        state.status.set_state(ConnectionState::Open);

        let response = build_health_response(&state);
        assert_eq!(response.status, HealthStatus::Healthy);
        assert_eq!(response.connection, "open");
        assert!(response.last_connected_at.is_some());
    }

    #[test]
    fn counters_flow_into_health_response() {
        let state = test_state();
        state.status.record_message();
        state.status.record_message();
        state.status.record_dropped_frame();

        let response = build_health_response(&state);
        assert_eq!(response.messages_received, 2);
        assert_eq!(response.frames_dropped, 1);
    }
}
