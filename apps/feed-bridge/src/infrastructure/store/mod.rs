//! Latest-Value Tick Cache
//!
//! One record per security id, last-write-wins. No history, no eviction:
//! the map is bounded by the set of distinct instruments ever seen, which in
//! practice is bounded by the static instrument catalogue.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::tick::TickRecord;

/// Concurrent-safe latest-value cache of decoded ticks.
#[derive(Debug, Default)]
pub struct TickStore {
    records: RwLock<HashMap<u32, TickRecord>>,
}

impl TickStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for its security id. O(1).
    pub fn upsert(&self, record: TickRecord) {
        self.records.write().insert(record.security_id, record);
    }

    /// Latest record for a security id, if one has been seen.
    #[must_use]
    pub fn get(&self, security_id: u32) -> Option<TickRecord> {
        self.records.read().get(&security_id).cloned()
    }

    /// All current records, in unspecified order.
    ///
    /// Used to seed new stream subscribers.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TickRecord> {
        self.records.read().values().cloned().collect()
    }

    /// Number of distinct security ids cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tick::FrameKind;

    fn tick(security_id: u32, price: f64) -> TickRecord {
        TickRecord {
            security_id,
            symbol: format!("SYM{security_id}"),
            price,
            timestamp: 1_700_000_000,
            kind: FrameKind::Ltp,
        }
    }

    #[test]
    fn upsert_is_last_write_wins() {
        let store = TickStore::new();

        store.upsert(tick(2885, 100.0));
        store.upsert(tick(2885, 101.5));

        assert_eq!(store.len(), 1);
        let record = store.get(2885).unwrap();
        assert_eq!(record.price, 101.5);
    }

    #[test]
    fn get_absent_id() {
        let store = TickStore::new();
        assert!(store.get(42).is_none());
    }

    #[test]
    fn snapshot_contains_every_record_once() {
        let store = TickStore::new();
        store.upsert(tick(1, 10.0));
        store.upsert(tick(2, 20.0));
        store.upsert(tick(3, 30.0));
        store.upsert(tick(2, 21.0));

        let mut snapshot = store.snapshot();
        snapshot.sort_by_key(|r| r.security_id);

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[1].price, 21.0);
    }

    #[test]
    fn empty_store_snapshot() {
        let store = TickStore::new();
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
    }
}
