//! Resource Monitor
//!
//! Samples the host, classifies load against thresholds and issues
//! corrective actions. The periodic loop lives in [`crate::tasks`].

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cache::CacheControl;
use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::monitor::rules::{self, Action};
use crate::monitor::{DiskUsage, MetricsSnapshot, SystemProbe};
use crate::storage::TempStorageCleaner;
use crate::tasks::spawn_monitor_task;

// == Tick Report ==
/// Outcome of one tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub snapshot: MetricsSnapshot,
    pub actions: Vec<Action>,
}

/// Host figures gathered in one blocking call.
struct HostSample {
    memory_usage_ratio: f64,
    cpu_usage_ratio: f64,
    process_memory_bytes: u64,
}

// == Resource Monitor ==
/// Threshold-driven self-healing for the process.
///
/// Constructed once at the composition point and shared by `Arc`. Watches any
/// number of caches through [`CacheControl`].
pub struct ResourceMonitor {
    config: MonitorConfig,
    probe: Arc<dyn SystemProbe>,
    storage: Arc<dyn TempStorageCleaner>,
    caches: Vec<Arc<dyn CacheControl>>,
}

impl ResourceMonitor {
    // == Constructor ==
    pub fn new(
        config: MonitorConfig,
        probe: Arc<dyn SystemProbe>,
        storage: Arc<dyn TempStorageCleaner>,
    ) -> Self {
        Self {
            config,
            probe,
            storage,
            caches: Vec::new(),
        }
    }

    /// Adds a cache to sample and to clear under memory pressure.
    pub fn with_cache(mut self, cache: Arc<dyn CacheControl>) -> Self {
        self.caches.push(cache);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    // == Start ==
    /// Starts the periodic loop. Cancel `token` to stop it.
    pub fn start(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        spawn_monitor_task(Arc::clone(self), token)
    }

    // == Tick ==
    /// Runs one full sample-then-evaluate cycle.
    ///
    /// The snapshot is logged at info level whether or not any rule fires.
    pub async fn tick(&self) -> Result<TickReport> {
        let snapshot = self.sample().await?;

        info!(
            memory_usage_ratio = snapshot.memory_usage_ratio,
            cpu_usage_ratio = snapshot.cpu_usage_ratio,
            disk_usage_ratio = snapshot.disk.usage_ratio,
            disk_total_bytes = snapshot.disk.total_bytes,
            disk_free_bytes = snapshot.disk.free_bytes,
            cache_size = snapshot.cache_size,
            cache_memory_estimate_bytes = snapshot.cache_memory_estimate_bytes,
            taken_at = %snapshot.taken_at,
            "Resource snapshot"
        );

        let actions = self.evaluate(&snapshot).await;
        Ok(TickReport { snapshot, actions })
    }

    // == Sample ==
    /// Collects a snapshot.
    ///
    /// A failed or slow filesystem probe degrades to a zeroed disk figure.
    /// Failure of the memory/CPU probe fails the sample.
    pub async fn sample(&self) -> Result<MetricsSnapshot> {
        let (host, disk) = tokio::join!(self.probe_host(), self.probe_disk());
        let host = host?;

        let cache_size = self.caches.iter().map(|cache| cache.size()).sum();

        Ok(MetricsSnapshot {
            memory_usage_ratio: host.memory_usage_ratio,
            cpu_usage_ratio: host.cpu_usage_ratio,
            disk,
            cache_size,
            cache_memory_estimate_bytes: host.process_memory_bytes,
            taken_at: Utc::now(),
        })
    }

    // == Evaluate ==
    /// Applies the threshold rules to `snapshot` and performs the actions.
    ///
    /// Action failures and timeouts are logged, not retried; the same rule
    /// gets another chance on the next tick.
    pub async fn evaluate(&self, snapshot: &MetricsSnapshot) -> Vec<Action> {
        let actions = rules::evaluate(snapshot, &self.config.thresholds);

        for action in &actions {
            match action {
                Action::ClearCaches => {
                    for cache in &self.caches {
                        let removed = cache.clear();
                        warn!(
                            cache = cache.name(),
                            removed,
                            memory_usage_ratio = snapshot.memory_usage_ratio,
                            threshold = self.config.thresholds.memory,
                            "High memory usage, cache cleared"
                        );
                    }
                }
                Action::ObserveCpu => {
                    warn!(
                        cpu_usage_ratio = snapshot.cpu_usage_ratio,
                        threshold = self.config.thresholds.cpu,
                        "High CPU usage"
                    );
                }
                Action::CleanupTempFiles => {
                    warn!(
                        disk_usage_ratio = snapshot.disk.usage_ratio,
                        threshold = self.config.thresholds.disk,
                        "High disk usage, cleaning temp files"
                    );
                    let cleanup = self.storage.cleanup_temp_files();
                    match tokio::time::timeout(self.config.action_timeout, cleanup).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => error!(error = %e, "Temp file cleanup failed"),
                        Err(_) => error!(
                            timeout_secs = self.config.action_timeout.as_secs_f64(),
                            "Temp file cleanup timed out"
                        ),
                    }
                }
            }
        }

        actions
    }

    // == Probes ==
    async fn probe_host(&self) -> Result<HostSample> {
        let probe = Arc::clone(&self.probe);
        let task = tokio::task::spawn_blocking(move || HostSample {
            memory_usage_ratio: probe.memory_usage_ratio(),
            cpu_usage_ratio: probe.cpu_usage_ratio(),
            process_memory_bytes: probe.process_memory_bytes(),
        });

        match tokio::time::timeout(self.config.probe_timeout, task).await {
            Ok(Ok(sample)) => Ok(sample),
            Ok(Err(e)) => Err(MonitorError::ProbeTask(e.to_string())),
            Err(_) => Err(MonitorError::ProbeTimeout(self.config.probe_timeout)),
        }
    }

    async fn probe_disk(&self) -> DiskUsage {
        let probe = Arc::clone(&self.probe);
        let path = self.config.disk_path.clone();
        let task = tokio::task::spawn_blocking(move || probe.disk_usage(&path));

        let err = match tokio::time::timeout(self.config.probe_timeout, task).await {
            Ok(Ok(Ok(disk))) => return disk,
            Ok(Ok(Err(e))) => e,
            Ok(Err(e)) => MonitorError::ProbeTask(e.to_string()),
            Err(_) => MonitorError::ProbeTimeout(self.config.probe_timeout),
        };

        warn!(
            path = %self.config.disk_path.display(),
            error = %err,
            "Disk probe failed, reporting zero usage"
        );
        DiskUsage::zeroed()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::storage::TempDirCleaner;
    use std::path::Path;
    use std::time::Duration;

    struct FixedProbe;

    impl SystemProbe for FixedProbe {
        fn memory_usage_ratio(&self) -> f64 {
            0.95
        }
        fn cpu_usage_ratio(&self) -> f64 {
            0.2
        }
        fn disk_usage(&self, _path: &Path) -> Result<DiskUsage> {
            Ok(DiskUsage::from_space(100, 60))
        }
        fn process_memory_bytes(&self) -> u64 {
            4096
        }
    }

    #[tokio::test]
    async fn test_tick_clears_real_cache_under_memory_pressure() {
        let cache = Arc::new(TtlCache::new("pages", 10, Duration::from_secs(60)));
        cache.set("a", 1u32, None);
        cache.set("b", 2u32, None);

        let dir = tempfile::tempdir().unwrap();
        let monitor = ResourceMonitor::new(
            MonitorConfig::default(),
            Arc::new(FixedProbe),
            Arc::new(TempDirCleaner::new(dir.path(), Duration::from_secs(60))),
        )
        .with_cache(cache.clone());

        let report = monitor.tick().await.unwrap();

        assert_eq!(report.snapshot.cache_size, 2);
        assert_eq!(report.snapshot.cache_memory_estimate_bytes, 4096);
        assert_eq!(report.snapshot.disk.usage_ratio, 0.4);
        assert_eq!(report.actions, vec![Action::ClearCaches]);
        assert!(cache.is_empty());
    }
}
