//! Prometheus Metrics Module
//!
//! Exposes bridge metrics via Prometheus format for monitoring.
//!
//! # Metrics
//!
//! - `feed_bridge_frames_received_total`: decoded binary frames
//! - `feed_bridge_frames_dropped_total`: malformed frames dropped
//! - `feed_bridge_reconnects_total`: scheduled reconnect attempts
//! - `feed_bridge_subscribers`: currently attached stream subscribers
//!
//! Metrics are rendered at `/metrics` on the HTTP server port.

use std::sync::OnceLock;

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

fn register_metrics() {
    describe_counter!(
        "feed_bridge_frames_received_total",
        "Total binary tick frames decoded from the feed"
    );
    describe_counter!(
        "feed_bridge_frames_dropped_total",
        "Total malformed frames dropped"
    );
    describe_counter!(
        "feed_bridge_reconnects_total",
        "Total scheduled feed reconnect attempts"
    );
    describe_gauge!(
        "feed_bridge_subscribers",
        "Currently attached stream subscribers"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let first = init_metrics();
        let second = init_metrics();
        // Same underlying recorder; both handles render.
        let _ = first.render();
        let _ = second.render();
    }

    #[test]
    fn handle_available_after_init() {
        let _ = init_metrics();
        assert!(get_metrics_handle().is_some());
    }
}
