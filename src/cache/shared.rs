//! Shared Cache Module
//!
//! Wraps [`CacheStore`] in a non-poisoning mutex and layers the
//! `get_or_set` helpers and the [`CacheControl`] seam on top.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::cache::{CacheStats, CacheStore};
use crate::config::CacheConfig;
use crate::monitor::process_memory_bytes;

// == Cache Control ==
/// The narrow view of a cache the resource monitor needs.
///
/// Object safe, so one monitor can watch caches of different value types.
pub trait CacheControl: Send + Sync {
    /// Label used in log lines.
    fn name(&self) -> &str;

    /// Current entry count. Cheap; takes only the cache lock.
    fn size(&self) -> usize;

    /// Entry count, counters and process memory estimate.
    ///
    /// Reads process memory from the OS, so it may block.
    fn stats(&self) -> CacheStats;

    /// Drops every entry, returning how many were removed.
    fn clear(&self) -> usize;
}

// == TTL Cache ==
/// A named, bounded TTL cache safe to share across threads and tasks.
///
/// Operations never fail: a miss is `None`, deleting an absent key is a
/// no-op. Values are cloned out, so `V` is usually cheap to clone or
/// wrapped in an `Arc`.
pub struct TtlCache<V> {
    name: String,
    inner: Mutex<CacheStore<V>>,
    in_flight: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V: Clone> TtlCache<V> {
    // == Constructor ==
    pub fn new(name: impl Into<String>, max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(CacheStore::new(max_entries, default_ttl)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(name: impl Into<String>, config: &CacheConfig) -> Self {
        Self::new(name, config.max_entries, config.default_ttl)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Basic Operations ==
    /// Inserts or replaces `key`, expiring after `ttl` or the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.inner.lock().set(key.into(), value, ttl);
    }

    /// Returns the live value for `key`, or None if absent or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().get(key)
    }

    /// Remaining lifetime of `key`, or None if absent or expired.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.inner.lock().ttl(key)
    }

    /// Removes `key`. Returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().delete(key)
    }

    /// Removes every entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = self.inner.lock().clear();
        debug!(cache = %self.name, removed, "Cache cleared");
        removed
    }

    /// Removes every expired entry. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.inner.lock().sweep_expired()
    }

    /// Returns counters, entry count and the process memory estimate.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.inner.lock().stats();
        stats.memory_usage_estimate_bytes = process_memory_bytes();
        stats
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.inner.lock().max_entries()
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.lock().default_ttl()
    }

    // == Get Or Set ==
    /// Returns the cached value, or computes, stores and returns it on a miss.
    ///
    /// Concurrent misses on the same key each run `producer`.
    pub fn get_or_set<F>(&self, key: &str, producer: F, ttl: Option<Duration>) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            return value;
        }

        let value = producer();
        self.set(key, value.clone(), ttl);
        value
    }

    /// Async, fallible form of [`get_or_set`](Self::get_or_set).
    ///
    /// A producer error is returned to the caller and nothing is stored.
    /// Concurrent misses on the same key each run `producer`.
    pub async fn get_or_try_set<F, Fut, E>(
        &self,
        key: &str,
        producer: F,
        ttl: Option<Duration>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = producer().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    /// Single-flight form of `get_or_set`.
    ///
    /// Concurrent misses on the same key wait on one shared producer run and
    /// all observe its value. If the running caller is dropped mid-flight the
    /// next waiter takes over as producer. The in-flight slot is released once
    /// the value is stored, or once the last waiter gives up.
    pub async fn get_or_set_coalesced<F, Fut>(
        &self,
        key: &str,
        producer: F,
        ttl: Option<Duration>,
    ) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.get(key) {
            return value;
        }

        let slot = {
            let mut in_flight = self.in_flight.lock();
            let cell = Arc::clone(
                in_flight
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            );
            InFlightSlot {
                in_flight: &self.in_flight,
                key,
                cell,
            }
        };

        let value = slot
            .cell
            .get_or_init(move || async move {
                let value = producer().await;
                self.set(key, value.clone(), ttl);
                value
            })
            .await
            .clone();
        value
    }
}

// == In-Flight Slot ==
/// One waiter's hold on a shared producer cell.
///
/// Dropping it (on success, cancellation or a producer panic) removes the
/// cell from the in-flight map once it is filled or no other waiter holds it.
struct InFlightSlot<'a, V> {
    in_flight: &'a Mutex<HashMap<String, Arc<OnceCell<V>>>>,
    key: &'a str,
    cell: Arc<OnceCell<V>>,
}

impl<V> Drop for InFlightSlot<'_, V> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock();
        let ours = in_flight
            .get(self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.cell));

        // Holders: the map, this slot, and any waiter still pending
        if ours && (self.cell.initialized() || Arc::strong_count(&self.cell) <= 2) {
            in_flight.remove(self.key);
        }
    }
}

impl<V> CacheControl for TtlCache<V>
where
    V: Clone + Send + Sync,
{
    fn name(&self) -> &str {
        TtlCache::name(self)
    }

    fn size(&self) -> usize {
        TtlCache::len(self)
    }

    fn stats(&self) -> CacheStats {
        TtlCache::stats(self)
    }

    fn clear(&self) -> usize {
        TtlCache::clear(self)
    }
}
