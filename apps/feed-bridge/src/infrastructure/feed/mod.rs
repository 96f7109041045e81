//! Feed Adapter
//!
//! WebSocket client for the upstream tick feed:
//!
//! - **messages**: JSON control requests (subscribe batches, mode-set)
//! - **codec**: binary frame decoding and subscription encoding
//! - **reconnect**: deterministic backoff policy
//! - **status**: shared connection status handle
//! - **client**: connection lifecycle state machine

pub mod client;
pub mod codec;
pub mod messages;
pub mod reconnect;
pub mod status;

pub use client::{FeedClient, FeedClientConfig, FeedClientError};
pub use codec::{CodecError, MAX_BATCH_SIZE, MIN_FRAME_LEN, TickFrame};
pub use messages::{FeedRequest, InstrumentRef, ModeRequest, SubscribeRequest};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use status::{ConnectionState, FeedStatus};
