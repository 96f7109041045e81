//! Tracing Initialization
//!
//! Structured logging via `tracing` with an env-filtered fmt layer.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: log filter (default: `feed_bridge=info`)

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "feed_bridge=info";

/// Initialize the global tracing subscriber.
///
/// Call once at startup, before any logging. A second call is a no-op
/// (the registry refuses re-initialization), which keeps tests safe.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
