//! Instrument Catalogue
//!
//! Immutable mapping between exchange instruments and their feed-assigned
//! subscription identifiers, with reverse lookup from identifier to symbol.
//!
//! The catalogue is built once at startup from enrichment data supplied by
//! an external collaborator. Malformed entries are configuration errors and
//! surface before any connection attempt.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Types
// =============================================================================

/// Market segment an instrument trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeSegment {
    /// Cash equity market.
    Equity,
    /// Futures and options market.
    Derivative,
}

impl ExchangeSegment {
    /// Segment code used on the subscribe wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equity => "NSE_EQ",
            Self::Derivative => "NSE_FNO",
        }
    }
}

/// A tradable instrument known to the bridge.
///
/// `security_id` is the feed-assigned numeric identifier, kept as a string
/// because that is how the subscribe wire carries it. It must parse as `u32`
/// so the reverse lookup can key on the identifier decoded from tick frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Human-readable trading symbol (e.g. "RELIANCE").
    pub symbol: String,
    /// Segment the instrument trades on.
    pub exchange_segment: ExchangeSegment,
    /// Feed-assigned subscription identifier.
    pub security_id: String,
}

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while building the instrument table.
///
/// These are configuration errors: fatal at startup, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstrumentError {
    /// An instrument has no security id.
    #[error("instrument {symbol:?} has an empty security id")]
    MissingSecurityId {
        /// Symbol of the offending instrument.
        symbol: String,
    },

    /// An instrument's security id is not a valid `u32`.
    #[error("instrument {symbol:?} has a non-numeric security id {security_id:?}")]
    InvalidSecurityId {
        /// Symbol of the offending instrument.
        symbol: String,
        /// The rejected security id value.
        security_id: String,
    },
}

// =============================================================================
// Instrument Table
// =============================================================================

/// Immutable instrument catalogue with reverse lookup by security id.
#[derive(Debug, Clone, Default)]
pub struct InstrumentTable {
    instruments: Vec<Instrument>,
    symbols_by_id: HashMap<u32, String>,
}

impl InstrumentTable {
    /// Build the table, validating every instrument.
    ///
    /// # Errors
    ///
    /// Returns an [`InstrumentError`] if any instrument carries an empty or
    /// non-numeric security id. A missing exchange segment is rejected
    /// earlier, at deserialization of the enrichment data.
    pub fn new(instruments: Vec<Instrument>) -> Result<Self, InstrumentError> {
        let mut symbols_by_id = HashMap::with_capacity(instruments.len());

        for instrument in &instruments {
            if instrument.security_id.trim().is_empty() {
                return Err(InstrumentError::MissingSecurityId {
                    symbol: instrument.symbol.clone(),
                });
            }

            let id: u32 = instrument.security_id.parse().map_err(|_| {
                InstrumentError::InvalidSecurityId {
                    symbol: instrument.symbol.clone(),
                    security_id: instrument.security_id.clone(),
                }
            })?;

            symbols_by_id.insert(id, instrument.symbol.clone());
        }

        Ok(Self {
            instruments,
            symbols_by_id,
        })
    }

    /// Resolve a security id to its symbol.
    ///
    /// Unknown ids resolve to the deterministic placeholder
    /// `"securityId:<id>"`; this never fails.
    #[must_use]
    pub fn resolve_symbol(&self, security_id: u32) -> String {
        self.symbols_by_id
            .get(&security_id)
            .cloned()
            .unwrap_or_else(|| format!("securityId:{security_id}"))
    }

    /// All instruments, in catalogue order, for subscription construction.
    #[must_use]
    pub fn all(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Number of instruments in the catalogue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Check whether the catalogue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument(symbol: &str, segment: ExchangeSegment, id: &str) -> Instrument {
        Instrument {
            symbol: symbol.to_string(),
            exchange_segment: segment,
            security_id: id.to_string(),
        }
    }

    #[test]
    fn resolves_known_symbol() {
        let table = InstrumentTable::new(vec![
            instrument("RELIANCE", ExchangeSegment::Equity, "2885"),
            instrument("NIFTYFUT", ExchangeSegment::Derivative, "53001"),
        ])
        .unwrap();

        assert_eq!(table.resolve_symbol(2885), "RELIANCE");
        assert_eq!(table.resolve_symbol(53001), "NIFTYFUT");
    }

    #[test]
    fn unknown_id_resolves_to_placeholder() {
        let table =
            InstrumentTable::new(vec![instrument("RELIANCE", ExchangeSegment::Equity, "2885")])
                .unwrap();

        assert_eq!(table.resolve_symbol(99999), "securityId:99999");
        assert_eq!(table.resolve_symbol(0), "securityId:0");
    }

    #[test]
    fn empty_security_id_is_rejected() {
        let err = InstrumentTable::new(vec![instrument("BAD", ExchangeSegment::Equity, "")])
            .unwrap_err();

        assert_eq!(
            err,
            InstrumentError::MissingSecurityId {
                symbol: "BAD".to_string()
            }
        );
    }

    #[test]
    fn non_numeric_security_id_is_rejected() {
        let err = InstrumentTable::new(vec![instrument("BAD", ExchangeSegment::Equity, "abc")])
            .unwrap_err();

        assert!(matches!(err, InstrumentError::InvalidSecurityId { .. }));
    }

    #[test]
    fn all_preserves_catalogue_order() {
        let instruments = vec![
            instrument("A", ExchangeSegment::Equity, "1"),
            instrument("B", ExchangeSegment::Derivative, "2"),
            instrument("C", ExchangeSegment::Equity, "3"),
        ];
        let table = InstrumentTable::new(instruments.clone()).unwrap();

        assert_eq!(table.all(), instruments.as_slice());
    }

    #[test]
    fn segment_deserializes_from_enrichment_names() {
        let json = r#"{"symbol":"RELIANCE","exchangeSegment":"EQUITY","securityId":"2885"}"#;
        let parsed: Instrument = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.exchange_segment, ExchangeSegment::Equity);
        assert_eq!(parsed.security_id, "2885");
    }

    #[test]
    fn missing_segment_fails_deserialization() {
        let json = r#"{"symbol":"RELIANCE","securityId":"2885"}"#;
        assert!(serde_json::from_str::<Instrument>(json).is_err());
    }

    #[test]
    fn segment_wire_codes() {
        assert_eq!(ExchangeSegment::Equity.as_str(), "NSE_EQ");
        assert_eq!(ExchangeSegment::Derivative.as_str(), "NSE_FNO");
    }
}
