//! Adaptive Cache - a bounded in-process TTL cache with a self-healing resource monitor
//!
//! The cache expires entries lazily and through a periodic sweep, and bulk-evicts
//! the entries closest to expiry when full. The monitor samples host memory, load
//! and disk usage and clears caches or temp files when thresholds are crossed.

pub mod cache;
pub mod config;
pub mod error;
pub mod monitor;
pub mod storage;
pub mod tasks;

pub use cache::{CacheControl, CacheStats, TtlCache};
pub use config::Config;
pub use monitor::{ResourceMonitor, SysinfoProbe};
pub use storage::{TempDirCleaner, TempStorageCleaner};
pub use tasks::{spawn_monitor_task, spawn_sweep_task};
