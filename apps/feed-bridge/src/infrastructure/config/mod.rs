//! Configuration Module
//!
//! Configuration loading for the bridge: environment settings plus the
//! instrument catalogue file.

mod settings;

use std::path::Path;

pub use settings::{
    BridgeConfig, ConfigError, Credentials, ServerSettings, WebSocketSettings,
};

use crate::domain::instrument::Instrument;

/// Load the instrument catalogue from a JSON file.
///
/// The file is a JSON array of instruments:
/// `[{"symbol":"RELIANCE","exchangeSegment":"EQUITY","securityId":"2885"}, ...]`
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed; both are
/// fatal configuration errors, raised before any connection attempt.
pub fn load_instruments(path: &Path) -> Result<Vec<Instrument>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::InstrumentFile {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| ConfigError::InstrumentParse {
        path: path.to_path_buf(),
        source,
    })
}
