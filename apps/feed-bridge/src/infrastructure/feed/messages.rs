//! Feed Wire Message Types
//!
//! Outgoing request types for the upstream feed's subscription protocol.
//! The feed accepts JSON control messages on the WebSocket and answers with
//! binary tick frames (decoded in [`super::codec`]).
//!
//! # Wire Format
//!
//! Subscribe request, one per batch of at most 100 instruments:
//! ```json
//! { "RequestCode": 15, "InstrumentCount": 2,
//!   "InstrumentList": [ { "ExchangeSegment": "NSE_EQ", "SecurityId": "2885" } ] }
//! ```
//!
//! Mode-set request, sent once after all subscribe batches:
//! ```json
//! { "RequestCode": 16, "Mode": 1 }
//! ```

use serde::Serialize;

use crate::domain::instrument::Instrument;

/// Request code for batched instrument subscription.
pub const SUBSCRIBE_REQUEST_CODE: u8 = 15;

/// Request code for selecting the tick mode.
pub const MODE_REQUEST_CODE: u8 = 16;

/// Mode value selecting last-traded-price ticks.
pub const LTP_MODE: u8 = 1;

/// One instrument entry on the subscribe wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstrumentRef {
    /// Segment code, e.g. `"NSE_EQ"`.
    #[serde(rename = "ExchangeSegment")]
    pub exchange_segment: &'static str,

    /// Feed-assigned identifier, as a string.
    #[serde(rename = "SecurityId")]
    pub security_id: String,
}

impl From<&Instrument> for InstrumentRef {
    fn from(instrument: &Instrument) -> Self {
        Self {
            exchange_segment: instrument.exchange_segment.as_str(),
            security_id: instrument.security_id.clone(),
        }
    }
}

/// Batched subscription request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeRequest {
    /// Always [`SUBSCRIBE_REQUEST_CODE`].
    #[serde(rename = "RequestCode")]
    pub request_code: u8,

    /// Number of instruments in this batch.
    #[serde(rename = "InstrumentCount")]
    pub instrument_count: usize,

    /// The batch itself, in catalogue order.
    #[serde(rename = "InstrumentList")]
    pub instrument_list: Vec<InstrumentRef>,
}

/// Tick-mode selection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeRequest {
    /// Always [`MODE_REQUEST_CODE`].
    #[serde(rename = "RequestCode")]
    pub request_code: u8,

    /// Selected mode; [`LTP_MODE`] for last-traded-price.
    #[serde(rename = "Mode")]
    pub mode: u8,
}

impl ModeRequest {
    /// The last-traded-price mode-set message.
    #[must_use]
    pub const fn ltp() -> Self {
        Self {
            request_code: MODE_REQUEST_CODE,
            mode: LTP_MODE,
        }
    }
}

/// Any control message the bridge sends to the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FeedRequest {
    /// A batched subscribe request.
    Subscribe(SubscribeRequest),
    /// The mode-set request.
    Mode(ModeRequest),
}

impl FeedRequest {
    /// Serialize the request to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails (should not happen with
    /// valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
