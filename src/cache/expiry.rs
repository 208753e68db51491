//! Expiry Index Module
//!
//! Orders keys by expiry instant for capacity eviction and the active sweep.

use std::collections::BTreeMap;
use std::time::Instant;

// == Expiry Index ==
/// Tracks keys ordered by `(expires_at, seq)`.
///
/// The first element is always the entry closest to expiry; among entries
/// with the same expiry instant the one inserted first comes first.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    order: BTreeMap<(Instant, u64), String>,
}

impl ExpiryIndex {
    // == Constructor ==
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
        }
    }

    // == Insert ==
    /// Records a key under its expiry slot.
    pub fn insert(&mut self, expires_at: Instant, seq: u64, key: String) {
        self.order.insert((expires_at, seq), key);
    }

    // == Remove ==
    /// Forgets the key stored under the given slot.
    pub fn remove(&mut self, expires_at: Instant, seq: u64) -> Option<String> {
        self.order.remove(&(expires_at, seq))
    }

    // == Pop Earliest ==
    /// Returns and removes the key closest to expiry.
    ///
    /// Returns None if the index is empty.
    pub fn pop_earliest(&mut self) -> Option<String> {
        self.order.pop_first().map(|(_, key)| key)
    }

    // == Drain Expired ==
    /// Removes and returns every key whose expiry instant is at or before `now`.
    pub fn drain_expired(&mut self, now: Instant) -> Vec<String> {
        // Everything strictly after (now, u64::MAX) is still live
        let live = self.order.split_off(&(now, u64::MAX));
        let expired = std::mem::replace(&mut self.order, live);

        // split_off keeps an exact (now, u64::MAX) key on the right side
        let mut keys: Vec<String> = expired.into_values().collect();
        if let Some(key) = self.order.remove(&(now, u64::MAX)) {
            keys.push(key);
        }
        keys
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
