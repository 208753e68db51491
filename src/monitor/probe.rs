//! Host Probe Module
//!
//! Reads OS memory, load average, filesystem and process memory figures.
//! Every call here may block; the monitor runs them on the blocking pool.

use std::path::Path;
use std::thread;

use parking_lot::Mutex;
use sysinfo::{Disks, System};

use crate::error::{MonitorError, Result};
use crate::monitor::DiskUsage;

// == System Probe ==
/// Source of host metrics.
pub trait SystemProbe: Send + Sync + 'static {
    /// Used / total physical memory.
    fn memory_usage_ratio(&self) -> f64;

    /// One-minute load average divided by logical core count.
    fn cpu_usage_ratio(&self) -> f64;

    /// Statistics of the filesystem holding `path`.
    fn disk_usage(&self, path: &Path) -> Result<DiskUsage>;

    /// Resident memory of the current process.
    fn process_memory_bytes(&self) -> u64;
}

// == Sysinfo Probe ==
/// [`SystemProbe`] backed by `sysinfo`.
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe for SysinfoProbe {
    fn memory_usage_ratio(&self) -> f64 {
        let mut system = self.system.lock();
        system.refresh_memory();

        let total = system.total_memory();
        if total == 0 {
            return 0.0;
        }
        system.used_memory() as f64 / total as f64
    }

    fn cpu_usage_ratio(&self) -> f64 {
        let cores = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        System::load_average().one / cores as f64
    }

    fn disk_usage(&self, path: &Path) -> Result<DiskUsage> {
        let resolved = path.canonicalize().map_err(|source| MonitorError::DiskProbe {
            path: path.to_path_buf(),
            source,
        })?;

        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .list()
            .iter()
            .filter(|disk| resolved.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().components().count())
            .ok_or_else(|| MonitorError::NoFilesystem(resolved.clone()))?;

        Ok(DiskUsage::from_space(
            disk.total_space(),
            disk.available_space(),
        ))
    }

    fn process_memory_bytes(&self) -> u64 {
        let mut system = self.system.lock();
        current_process_memory(&mut system)
    }
}

// == Process Memory ==
/// Resident memory of the current process, 0 if it cannot be read.
pub fn process_memory_bytes() -> u64 {
    let mut system = System::new();
    current_process_memory(&mut system)
}

fn current_process_memory(system: &mut System) -> u64 {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0;
    };
    system.refresh_process(pid);
    system.process(pid).map(|p| p.memory()).unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_ratio_in_range() {
        let probe = SysinfoProbe::new();
        let ratio = probe.memory_usage_ratio();
        assert!(ratio >= 0.0);
        assert!(ratio <= 1.0);
    }

    #[test]
    fn test_cpu_ratio_non_negative() {
        let probe = SysinfoProbe::new();
        assert!(probe.cpu_usage_ratio() >= 0.0);
    }

    #[test]
    fn test_disk_usage_missing_path_errors() {
        let probe = SysinfoProbe::new();
        let result = probe.disk_usage(Path::new("/definitely/not/a/real/path/xyz"));
        assert!(matches!(result, Err(MonitorError::DiskProbe { .. })));
    }

    #[test]
    fn test_process_memory_does_not_panic() {
        // Zero is acceptable on platforms without process accounting
        let _ = process_memory_bytes();
        let _ = SysinfoProbe::new().process_memory_bytes();
    }
}
