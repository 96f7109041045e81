//! Tick Records and Stream Events
//!
//! Canonical internal representation of a decoded tick, plus the outward
//! event envelope delivered to stream consumers.

use serde::Serialize;
use serde::ser::SerializeStruct;

// =============================================================================
// Frame Kind
// =============================================================================

/// Feed frame type, taken from the first byte of a binary tick frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Last-traded-price frame (code 0x02).
    Ltp,
    /// Quote frame (code 0x06).
    Quote,
    /// Any other frame code, carried through unlabeled.
    Other(u8),
}

impl FrameKind {
    /// Wire code for last-traded-price frames.
    pub const LTP: u8 = 0x02;

    /// Wire code for quote frames.
    pub const QUOTE: u8 = 0x06;

    /// Classify a wire code.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            Self::LTP => Self::Ltp,
            Self::QUOTE => Self::Quote,
            other => Self::Other(other),
        }
    }

    /// The raw wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Ltp => Self::LTP,
            Self::Quote => Self::QUOTE,
            Self::Other(code) => code,
        }
    }

    /// Human-readable label: `"LTP"`, `"QUOTE"`, or `"TYPE_<n>"`.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::Ltp => "LTP".to_string(),
            Self::Quote => "QUOTE".to_string(),
            Self::Other(code) => format!("TYPE_{code}"),
        }
    }
}

// =============================================================================
// Tick Record
// =============================================================================

/// A decoded tick: one record exists per security id at any time.
///
/// Produced exclusively by the codec path; mutated in place in the store
/// (last-write-wins), never partially updated.
#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    /// Feed-assigned instrument identifier.
    pub security_id: u32,
    /// Resolved trading symbol, or the `"securityId:<id>"` placeholder.
    pub symbol: String,
    /// Traded price.
    pub price: f64,
    /// Unix timestamp of the tick, in seconds.
    pub timestamp: u32,
    /// Frame type the tick was decoded from.
    pub kind: FrameKind,
}

// Wire contract for stream consumers:
// {securityId, symbol, price, timestamp, messageType, messageTypeLabel}
impl Serialize for TickRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut record = serializer.serialize_struct("TickRecord", 6)?;
        record.serialize_field("securityId", &self.security_id)?;
        record.serialize_field("symbol", &self.symbol)?;
        record.serialize_field("price", &self.price)?;
        record.serialize_field("timestamp", &self.timestamp)?;
        record.serialize_field("messageType", &self.kind.code())?;
        record.serialize_field("messageTypeLabel", &self.kind.label())?;
        record.end()
    }
}

// =============================================================================
// Stream Events
// =============================================================================

/// Event envelope delivered to stream subscribers.
///
/// Serializes as `{"type":"initial","data":[...]}` on subscribe and
/// `{"type":"tick","data":{...}}` per published tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Full store snapshot, sent once when a subscriber attaches.
    Initial(Vec<TickRecord>),
    /// A single live tick.
    Tick(TickRecord),
}

// =============================================================================
// Tests
// =============================================================================
