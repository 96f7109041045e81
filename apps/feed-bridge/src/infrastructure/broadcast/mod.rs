//! Tick Fan-Out
//!
//! Delivers stream events to a dynamic set of live subscribers. Each
//! subscriber is an opaque sink that may fail or disappear at any time; a
//! sink that refuses delivery is removed during the same publish pass and
//! never awaited.
//!
//! # Delivery Semantics
//!
//! - `subscribe` registers a sink and delivers one `initial` event carrying
//!   the full store snapshot, atomically with registration: no tick
//!   published after the snapshot can be missed or reordered before it.
//! - `publish` walks the registry under a read lock collecting failures,
//!   then sweeps the failed sinks out under a write lock. The registry is
//!   never mutated mid-iteration.
//! - `unsubscribe` is idempotent.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::tick::{StreamEvent, TickRecord};
use crate::infrastructure::store::TickStore;

/// Identifier handed out by [`Broadcaster::subscribe`], used for removal.
pub type SubscriptionId = u64;

/// Delivery failure: the sink is gone or cannot accept more data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sink closed or refused delivery")]
pub struct SinkClosed;

/// An opaque, non-blocking event sink.
///
/// Delivery must never block: a slow consumer signals [`SinkClosed`] and is
/// treated as failed.
pub trait TickSink: Send + Sync {
    /// Attempt to deliver one event without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`SinkClosed`] if the sink is gone or full.
    fn try_deliver(&self, event: &StreamEvent) -> Result<(), SinkClosed>;
}

impl TickSink for mpsc::Sender<StreamEvent> {
    fn try_deliver(&self, event: &StreamEvent) -> Result<(), SinkClosed> {
        self.try_send(event.clone()).map_err(|_| SinkClosed)
    }
}

/// Fan-out registry of live subscribers.
pub struct Broadcaster {
    store: Arc<TickStore>,
    sinks: RwLock<HashMap<SubscriptionId, Box<dyn TickSink>>>,
    next_id: AtomicU64,
}

impl Broadcaster {
    /// Create a broadcaster seeding new subscribers from `store`.
    #[must_use]
    pub fn new(store: Arc<TickStore>) -> Self {
        Self {
            store,
            sinks: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a sink and deliver the initial store snapshot.
    ///
    /// The returned id is valid for [`Self::unsubscribe`] whether or not the
    /// initial delivery succeeded; a sink that refuses its own snapshot is
    /// not registered.
    pub fn subscribe(&self, sink: Box<dyn TickSink>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Holding the write lock across snapshot + initial delivery keeps
        // registration atomic with respect to concurrent publishes.
        let mut sinks = self.sinks.write();
        let initial = StreamEvent::Initial(self.store.snapshot());
        if sink.try_deliver(&initial).is_ok() {
            sinks.insert(id, sink);
            metrics::gauge!("feed_bridge_subscribers").set(approx_f64(sinks.len()));
        } else {
            tracing::debug!(subscription = id, "sink refused initial snapshot");
        }

        id
    }

    /// Deliver a tick to every registered sink, pruning failed ones.
    pub fn publish(&self, record: &TickRecord) {
        let event = StreamEvent::Tick(record.clone());

        let failed: Vec<SubscriptionId> = {
            let sinks = self.sinks.read();
            sinks
                .iter()
                .filter(|(_, sink)| sink.try_deliver(&event).is_err())
                .map(|(id, _)| *id)
                .collect()
        };

        if !failed.is_empty() {
            let mut sinks = self.sinks.write();
            for id in &failed {
                sinks.remove(id);
            }
            metrics::gauge!("feed_bridge_subscribers").set(approx_f64(sinks.len()));
            tracing::debug!(removed = failed.len(), "pruned dead subscribers");
        }
    }

    /// Remove a subscriber. Removing an unknown id is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut sinks = self.sinks.write();
        if sinks.remove(&id).is_some() {
            metrics::gauge!("feed_bridge_subscribers").set(approx_f64(sinks.len()));
        }
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sinks.read().len()
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_precision_loss)]
fn approx_f64(count: usize) -> f64 {
    count as f64
}

// =============================================================================
// Tests
// =============================================================================
