//! Feed Bridge Binary
//!
//! Starts the market data feed bridge.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p feed-bridge
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `FEED_ACCESS_TOKEN`: upstream feed access token
//! - `FEED_CLIENT_ID`: upstream feed client id
//!
//! ## Optional
//! - `FEED_HOST`: upstream feed host (default: api-feed.dhan.co)
//! - `FEED_BRIDGE_INSTRUMENTS_FILE`: instrument catalogue path (default: instruments.json)
//! - `FEED_BRIDGE_HTTP_PORT`: HTTP server port (default: 8080)
//! - `FEED_BRIDGE_STREAM_CHANNEL_CAPACITY`: per-subscriber buffer (default: 256)
//! - `FEED_BRIDGE_RECONNECT_DELAY_INITIAL_MS`: backoff floor (default: 5000)
//! - `FEED_BRIDGE_RECONNECT_DELAY_MAX_MS`: backoff cap (default: 60000)
//! - `FEED_BRIDGE_RECONNECT_DELAY_MULTIPLIER`: backoff multiplier (default: 1.5)
//! - `RUST_LOG`: log filter (default: feed_bridge=info)

use std::sync::Arc;

use anyhow::Context;
use feed_bridge::infrastructure::config;
use feed_bridge::{
    Broadcaster, FeedClient, FeedClientConfig, FeedStatus, HttpServer, HttpServerState,
    InstrumentTable, ReconnectConfig, TickStore, init_metrics, init_telemetry,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    let _ = dotenvy::dotenv();

    init_telemetry();

    tracing::info!("starting feed bridge");

    let _metrics_handle = init_metrics();

    let bridge_config =
        config::BridgeConfig::from_env().context("configuration error; not retrying")?;
    log_config(&bridge_config);

    let instruments = config::load_instruments(&bridge_config.instruments_file)
        .context("instrument catalogue could not be loaded")?;
    let table = Arc::new(
        InstrumentTable::new(instruments).context("instrument catalogue failed validation")?,
    );
    tracing::info!(instruments = table.len(), "instrument catalogue loaded");

    let shutdown_token = CancellationToken::new();

    let store = Arc::new(TickStore::new());
    let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&store)));
    let status = Arc::new(FeedStatus::new());

    let client_config = FeedClientConfig {
        url: bridge_config.feed_url(),
        reconnect: ReconnectConfig {
            initial_delay: bridge_config.websocket.reconnect_delay_initial,
            max_delay: bridge_config.websocket.reconnect_delay_max,
            multiplier: bridge_config.websocket.reconnect_delay_multiplier,
        },
    };
    let client = Arc::new(FeedClient::new(
        client_config,
        Arc::clone(&table),
        Arc::clone(&store),
        Arc::clone(&broadcaster),
        Arc::clone(&status),
        shutdown_token.child_token(),
    ));
    client.start();

    let http_state = Arc::new(HttpServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&status),
        Arc::clone(&store),
        Arc::clone(&broadcaster),
        bridge_config.server.stream_channel_capacity,
    ));
    let http_server = HttpServer::new(
        bridge_config.server.http_port,
        http_state,
        shutdown_token.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = http_server.run().await {
            tracing::error!(error = %e, "HTTP server error");
        }
    });

    tracing::info!("feed bridge ready");

    await_shutdown().await;

    client.stop();
    shutdown_token.cancel();

    tracing::info!("feed bridge stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &feed_bridge::BridgeConfig) {
    tracing::info!(
        feed_host = %config.feed_host,
        http_port = config.server.http_port,
        instruments_file = %config.instruments_file.display(),
        "configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, initiating shutdown");
        }
    }
}
