//! Metrics Snapshot Module
//!
//! Host and cache figures taken once per monitor tick.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Disk Usage ==
/// Filesystem statistics for the probed path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub free_bytes: u64,
    /// `(total - free) / total`, 0.0 when total is unknown
    pub usage_ratio: f64,
}

impl DiskUsage {
    /// The value reported when the filesystem probe fails.
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn from_space(total_bytes: u64, free_bytes: u64) -> Self {
        let usage_ratio = if total_bytes == 0 {
            0.0
        } else {
            total_bytes.saturating_sub(free_bytes) as f64 / total_bytes as f64
        };

        Self {
            total_bytes,
            free_bytes,
            usage_ratio,
        }
    }
}

// == Metrics Snapshot ==
/// Host and cache metrics sampled in a single tick.
///
/// Ratios are fractions of 1.0; values slightly above 1.0 (load average on
/// a saturated host) are kept as measured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub memory_usage_ratio: f64,
    pub cpu_usage_ratio: f64,
    pub disk: DiskUsage,
    /// Total entries across all watched caches
    pub cache_size: usize,
    /// Process-wide resident memory
    pub cache_memory_estimate_bytes: u64,
    pub taken_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Builds a snapshot from bare ratios, with zeroed cache figures.
    ///
    /// Useful for simulating host conditions.
    pub fn from_ratios(memory_usage_ratio: f64, cpu_usage_ratio: f64, disk_usage_ratio: f64) -> Self {
        Self {
            memory_usage_ratio,
            cpu_usage_ratio,
            disk: DiskUsage {
                usage_ratio: disk_usage_ratio,
                ..DiskUsage::default()
            },
            cache_size: 0,
            cache_memory_estimate_bytes: 0,
            taken_at: Utc::now(),
        }
    }

    pub fn disk_usage_ratio(&self) -> f64 {
        self.disk.usage_ratio
    }
}
