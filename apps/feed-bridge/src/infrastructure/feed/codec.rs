//! Tick Codec
//!
//! Encodes subscription requests and decodes the feed's binary tick frames.
//!
//! # Binary Frame Layout
//!
//! Incoming tick frames are fixed-layout little-endian records of at least
//! 16 bytes:
//!
//! | offset | size | field        |
//! |--------|------|--------------|
//! | 0      | 1    | frame kind   |
//! | 1      | 2    | frame length (unused) |
//! | 3      | 1    | segment code (unused) |
//! | 4      | 4    | security id, u32      |
//! | 8      | 4    | price, f32            |
//! | 12     | 4    | epoch seconds, u32    |
//!
//! Shorter buffers are malformed; the caller drops the frame and keeps the
//! connection. Text payloads from the feed are never routed here.

use thiserror::Error;

use crate::domain::instrument::Instrument;
use crate::domain::tick::FrameKind;

use super::messages::{
    FeedRequest, InstrumentRef, ModeRequest, SUBSCRIBE_REQUEST_CODE, SubscribeRequest,
};

/// Minimum length of a decodable binary frame.
pub const MIN_FRAME_LEN: usize = 16;

/// Maximum instruments per subscribe batch.
pub const MAX_BATCH_SIZE: usize = 100;

/// Codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Frame too short to carry a tick; drop it, keep the connection.
    #[error("malformed frame: {len} bytes, need at least {MIN_FRAME_LEN}")]
    MalformedFrame {
        /// Length of the rejected buffer.
        len: usize,
    },

    /// JSON encoding of an outgoing request failed.
    #[error("request encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A decoded binary tick frame, before symbol resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickFrame {
    /// Frame type from byte 0.
    pub kind: FrameKind,
    /// Instrument identifier from bytes 4..8.
    pub security_id: u32,
    /// Price from bytes 8..12, widened from f32.
    pub price: f64,
    /// Unix timestamp from bytes 12..16, in seconds.
    pub epoch_seconds: u32,
}

/// Decode one binary frame.
///
/// # Errors
///
/// Returns [`CodecError::MalformedFrame`] for buffers shorter than
/// [`MIN_FRAME_LEN`] bytes, for any byte content.
pub fn decode_frame(payload: &[u8]) -> Result<TickFrame, CodecError> {
    if payload.len() < MIN_FRAME_LEN {
        return Err(CodecError::MalformedFrame {
            len: payload.len(),
        });
    }

    let le_u32 =
        |at: usize| u32::from_le_bytes([payload[at], payload[at + 1], payload[at + 2], payload[at + 3]]);
    let le_f32 =
        |at: usize| f32::from_le_bytes([payload[at], payload[at + 1], payload[at + 2], payload[at + 3]]);

    Ok(TickFrame {
        kind: FrameKind::from_code(payload[0]),
        security_id: le_u32(4),
        price: f64::from(le_f32(8)),
        epoch_seconds: le_u32(12),
    })
}

/// Build the full subscription sequence for an instrument list.
///
/// Partitions the list into consecutive batches of at most
/// [`MAX_BATCH_SIZE`], preserving catalogue order, then appends exactly one
/// mode-set message selecting last-traded-price ticks. Pure and idempotent:
/// the same input always yields the same messages.
#[must_use]
pub fn subscription_requests(instruments: &[Instrument]) -> Vec<FeedRequest> {
    let mut requests = Vec::with_capacity(instruments.len().div_ceil(MAX_BATCH_SIZE) + 1);

    for batch in instruments.chunks(MAX_BATCH_SIZE) {
        requests.push(FeedRequest::Subscribe(SubscribeRequest {
            request_code: SUBSCRIBE_REQUEST_CODE,
            instrument_count: batch.len(),
            instrument_list: batch.iter().map(InstrumentRef::from).collect(),
        }));
    }

    requests.push(FeedRequest::Mode(ModeRequest::ltp()));
    requests
}

// =============================================================================
// Tests
// =============================================================================
