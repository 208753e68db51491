//! Cache Module
//!
//! Provides a bounded in-memory cache with TTL expiration and bulk
//! oldest-first capacity eviction.

mod entry;
mod expiry;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use expiry::ExpiryIndex;
pub use shared::{CacheControl, TtlCache};
pub use stats::CacheStats;
pub use store::CacheStore;

use std::time::Duration;

// == Public Constants ==
/// Longest TTL honoured; larger values are clamped
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Capacity eviction removes `ceil(len / EVICTION_DIVISOR)` entries
pub const EVICTION_DIVISOR: usize = 10;
