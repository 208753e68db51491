//! Cache Store Module
//!
//! Single-threaded cache engine: HashMap storage plus an expiry index driving
//! lazy expiry, the active sweep and bulk capacity eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, ExpiryIndex, EVICTION_DIVISOR};

// == Cache Store ==
/// Bounded key/value storage with per-entry TTL.
///
/// All methods take `&mut self`; [`TtlCache`](crate::cache::TtlCache) wraps
/// the store in a mutex for concurrent use.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Keys ordered by expiry instant
    expiry: ExpiryIndex,
    /// Counters
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL for entries stored without an explicit one
    default_ttl: Duration,
    /// Next insertion sequence number
    next_seq: u64,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            expiry: ExpiryIndex::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
            default_ttl,
            next_seq: 0,
        }
    }

    // == Set ==
    /// Stores a key-value pair, replacing any existing entry wholesale.
    ///
    /// When a new key arrives while the store is at capacity, the tenth of
    /// entries closest to expiry (at least one) is evicted first.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses `default_ttl` if None)
    pub fn set(&mut self, key: String, value: V, ttl: Option<Duration>) {
        if let Some(previous) = self.entries.remove(&key) {
            self.expiry.remove(previous.expires_at, previous.seq);
        } else if self.entries.len() >= self.max_entries {
            self.evict_for_capacity();
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl), seq);
        self.expiry.insert(entry.expires_at, seq, key.clone());
        self.entries.insert(key, entry);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns None for absent and expired keys alike; an expired entry is
    /// removed on the way out.
    pub fn get(&mut self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == TTL ==
    /// Returns the remaining lifetime of `key`, or None if absent or expired.
    ///
    /// Does not count as a hit or miss.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(CacheEntry::ttl_remaining)
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Clear ==
    /// Removes every entry. Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.expiry.clear();
        removed
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let expired_keys = self.expiry.drain_expired(Instant::now());
        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
        }

        self.stats.record_expirations(count);
        count
    }

    // == Stats ==
    /// Returns current counters and entry count.
    ///
    /// `memory_usage_estimate_bytes` is left at zero; the process-level figure
    /// is filled in by the caller outside any lock.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_size(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.expiry.remove(entry.expires_at, entry.seq);
        Some(entry)
    }

    fn evict_for_capacity(&mut self) -> usize {
        let target = self.entries.len().div_ceil(EVICTION_DIVISOR).max(1);
        let mut evicted = 0;

        while evicted < target {
            let Some(key) = self.expiry.pop_earliest() else {
                break;
            };
            self.entries.remove(&key);
            evicted += 1;
        }

        self.stats.record_evictions(evicted);
        debug!(
            evicted,
            remaining = self.entries.len(),
            max_entries = self.max_entries,
            "Capacity eviction"
        );
        evicted
    }
}
