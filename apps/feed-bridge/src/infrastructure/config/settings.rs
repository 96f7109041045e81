//! Bridge Configuration Settings
//!
//! Configuration types for the feed bridge, loaded from environment
//! variables. Missing credentials are a fatal configuration error surfaced
//! synchronously at startup, before any connect attempt.

use std::path::PathBuf;
use std::time::Duration;

/// Default upstream feed host.
const DEFAULT_FEED_HOST: &str = "api-feed.dhan.co";

/// Default instrument catalogue file.
const DEFAULT_INSTRUMENTS_FILE: &str = "instruments.json";

/// Feed credentials, passed through to the upstream as URL parameters.
#[derive(Clone)]
pub struct Credentials {
    access_token: String,
    client_id: String,
}

impl Credentials {
    /// Create new credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if either value is empty.
    pub fn new(access_token: String, client_id: String) -> Result<Self, ConfigError> {
        if access_token.is_empty() {
            return Err(ConfigError::EmptyValue("FEED_ACCESS_TOKEN".to_string()));
        }
        if client_id.is_empty() {
            return Err(ConfigError::EmptyValue("FEED_CLIENT_ID".to_string()));
        }
        Ok(Self {
            access_token,
            client_id,
        })
    }

    /// The feed access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The feed client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// WebSocket connection settings.
#[derive(Debug, Clone)]
pub struct WebSocketSettings {
    /// Initial reconnection delay.
    pub reconnect_delay_initial: Duration,
    /// Maximum reconnection delay.
    pub reconnect_delay_max: Duration,
    /// Reconnection delay multiplier.
    pub reconnect_delay_multiplier: f64,
}

impl Default for WebSocketSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_initial: Duration::from_millis(5000),
            reconnect_delay_max: Duration::from_millis(60_000),
            reconnect_delay_multiplier: 1.5,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Port for the health and stream endpoints.
    pub http_port: u16,
    /// Per-subscriber event channel capacity for the SSE stream.
    pub stream_channel_capacity: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_port: 8080,
            stream_channel_capacity: 256,
        }
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Upstream feed host.
    pub feed_host: String,
    /// Feed credentials.
    pub credentials: Credentials,
    /// Path to the instrument catalogue JSON file.
    pub instruments_file: PathBuf,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// WebSocket connection settings.
    pub websocket: WebSocketSettings,
}

impl BridgeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if required credentials are missing or
    /// empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// Split out from [`Self::from_env`] so tests can exercise the
    /// resolution rules without touching process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if required credentials are missing or
    /// empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let access_token = lookup("FEED_ACCESS_TOKEN")
            .ok_or_else(|| ConfigError::MissingEnvVar("FEED_ACCESS_TOKEN".to_string()))?;
        let client_id = lookup("FEED_CLIENT_ID")
            .ok_or_else(|| ConfigError::MissingEnvVar("FEED_CLIENT_ID".to_string()))?;
        let credentials = Credentials::new(access_token, client_id)?;

        let feed_host = lookup("FEED_HOST").unwrap_or_else(|| DEFAULT_FEED_HOST.to_string());

        let instruments_file = lookup("FEED_BRIDGE_INSTRUMENTS_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_INSTRUMENTS_FILE), PathBuf::from);

        let server_defaults = ServerSettings::default();
        let server = ServerSettings {
            http_port: parse_var(&lookup, "FEED_BRIDGE_HTTP_PORT", server_defaults.http_port),
            stream_channel_capacity: parse_var(
                &lookup,
                "FEED_BRIDGE_STREAM_CHANNEL_CAPACITY",
                server_defaults.stream_channel_capacity,
            ),
        };

        let ws_defaults = WebSocketSettings::default();
        let websocket = WebSocketSettings {
            reconnect_delay_initial: parse_duration_millis(
                &lookup,
                "FEED_BRIDGE_RECONNECT_DELAY_INITIAL_MS",
                ws_defaults.reconnect_delay_initial,
            ),
            reconnect_delay_max: parse_duration_millis(
                &lookup,
                "FEED_BRIDGE_RECONNECT_DELAY_MAX_MS",
                ws_defaults.reconnect_delay_max,
            ),
            reconnect_delay_multiplier: parse_var(
                &lookup,
                "FEED_BRIDGE_RECONNECT_DELAY_MULTIPLIER",
                ws_defaults.reconnect_delay_multiplier,
            ),
        };

        Ok(Self {
            feed_host,
            credentials,
            instruments_file,
            server,
            websocket,
        })
    }

    /// The full feed WebSocket URL with credentials as query parameters.
    #[must_use]
    pub fn feed_url(&self) -> String {
        format!(
            "wss://{}?version=2&token={}&clientId={}&authType=2",
            self.feed_host,
            self.credentials.access_token(),
            self.credentials.client_id(),
        )
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),

    /// Instrument catalogue file could not be read.
    #[error("failed to read instrument file {path}: {source}")]
    InstrumentFile {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Instrument catalogue file is not valid JSON.
    #[error("failed to parse instrument file {path}: {source}")]
    InstrumentParse {
        /// Path of the malformed file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_duration_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Duration {
    lookup(key)
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
