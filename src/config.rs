//! Configuration Module
//!
//! Loads cache, monitor and temp-cleaner settings from environment variables.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::monitor::Thresholds;

/// Environment name that selects the production data directory.
pub const PRODUCTION_ENV: &str = "production";

/// Data directory used when `APP_ENV=production`.
pub const PRODUCTION_DATA_DIR: &str = "/app/data";

/// Data directory used in every other environment.
pub const LOCAL_DATA_DIR: &str = "./data";

// == Cache Config ==
/// Settings for a single [`TtlCache`](crate::cache::TtlCache) instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// TTL applied when `set` is called without one
    pub default_ttl: Duration,
    /// Period of the active expiry sweep
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

// == Monitor Config ==
/// Settings for the [`ResourceMonitor`](crate::monitor::ResourceMonitor).
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Fixed tick period
    pub interval: Duration,
    /// Upper bound on a single blocking probe
    pub probe_timeout: Duration,
    /// Upper bound on a single corrective action
    pub action_timeout: Duration,
    /// Path whose filesystem is probed for disk usage
    pub disk_path: PathBuf,
    /// Ratios above which corrective actions fire
    pub thresholds: Thresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            action_timeout: Duration::from_secs(60),
            disk_path: PathBuf::from(LOCAL_DATA_DIR),
            thresholds: Thresholds::default(),
        }
    }
}

// == Cleaner Config ==
/// Settings for the [`TempDirCleaner`](crate::storage::TempDirCleaner).
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// Directory holding temporary files
    pub dir: PathBuf,
    /// Files last modified longer ago than this are removed
    pub max_age: Duration,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            dir: Path::new(LOCAL_DATA_DIR).join("tmp"),
            max_age: Duration::from_secs(24 * 60 * 60),
        }
    }
}

// == Config ==
/// Full process configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Deployment environment name (`APP_ENV`)
    pub environment: String,
    pub cache: CacheConfig,
    pub monitor: MonitorConfig,
    pub cleaner: CleanerConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `APP_ENV` - `production` selects `/app/data` as data directory (default: development)
    /// - `DATA_DIR` - Overrides the data directory probed for disk usage
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `CACHE_SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 60)
    /// - `MONITOR_INTERVAL` - Monitor tick frequency in seconds (default: 30)
    /// - `MONITOR_PROBE_TIMEOUT` - Probe timeout in seconds (default: 5)
    /// - `MONITOR_ACTION_TIMEOUT` - Corrective action timeout in seconds (default: 60)
    /// - `MONITOR_MEMORY_THRESHOLD` / `MONITOR_CPU_THRESHOLD` / `MONITOR_DISK_THRESHOLD`
    ///   (defaults: 0.85 / 0.70 / 0.80)
    /// - `TEMP_DIR` - Temp file directory (default: `<data dir>/tmp`)
    /// - `TEMP_MAX_AGE` - Temp file age cutoff in seconds (default: 86400)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    ///
    /// Missing or unparseable values, and zero durations, fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let parse = |name: &str| lookup(name).and_then(|v| v.trim().parse::<f64>().ok());

        let environment = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_data_dir(&environment));

        let cache = CacheConfig {
            max_entries: parse_or(&lookup, "CACHE_MAX_ENTRIES", defaults.cache.max_entries),
            default_ttl: secs_or(&lookup, "CACHE_DEFAULT_TTL", defaults.cache.default_ttl),
            sweep_interval: secs_or(&lookup, "CACHE_SWEEP_INTERVAL", defaults.cache.sweep_interval),
        };

        let base = defaults.monitor.thresholds;
        let monitor = MonitorConfig {
            interval: secs_or(&lookup, "MONITOR_INTERVAL", defaults.monitor.interval),
            probe_timeout: secs_or(&lookup, "MONITOR_PROBE_TIMEOUT", defaults.monitor.probe_timeout),
            action_timeout: secs_or(&lookup, "MONITOR_ACTION_TIMEOUT", defaults.monitor.action_timeout),
            disk_path: data_dir.clone(),
            thresholds: Thresholds {
                memory: parse("MONITOR_MEMORY_THRESHOLD").unwrap_or(base.memory),
                cpu: parse("MONITOR_CPU_THRESHOLD").unwrap_or(base.cpu),
                disk: parse("MONITOR_DISK_THRESHOLD").unwrap_or(base.disk),
            },
        };

        let cleaner = CleanerConfig {
            dir: lookup("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("tmp")),
            max_age: secs_or(&lookup, "TEMP_MAX_AGE", defaults.cleaner.max_age),
        };

        Self {
            environment,
            cache,
            monitor,
            cleaner,
        }
    }

    /// Returns true when running with `APP_ENV=production`.
    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION_ENV
    }
}

// == Helpers ==
/// Returns the fixed data directory for the given environment name.
pub fn default_data_dir(environment: &str) -> PathBuf {
    if environment == PRODUCTION_ENV {
        PathBuf::from(PRODUCTION_DATA_DIR)
    } else {
        PathBuf::from(LOCAL_DATA_DIR)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn secs_or<F>(lookup: &F, name: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(default)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache.max_entries, 1000);
        assert_eq!(config.cache.default_ttl, Duration::from_secs(3600));
        assert_eq!(config.cache.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.monitor.interval, Duration::from_secs(30));
        assert_eq!(config.monitor.thresholds, Thresholds::default());
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.environment, "development");
        assert!(!config.is_production());
        assert_eq!(config.monitor.disk_path, PathBuf::from(LOCAL_DATA_DIR));
        assert_eq!(config.cleaner.dir, PathBuf::from(LOCAL_DATA_DIR).join("tmp"));
        assert_eq!(config.monitor.thresholds.memory, 0.85);
        assert_eq!(config.monitor.thresholds.cpu, 0.70);
        assert_eq!(config.monitor.thresholds.disk, 0.80);
    }

    #[test]
    fn test_production_selects_app_data_dir() {
        let config = Config::from_lookup(lookup_from(&[("APP_ENV", "production")]));
        assert!(config.is_production());
        assert_eq!(config.monitor.disk_path, PathBuf::from(PRODUCTION_DATA_DIR));
        assert_eq!(config.cleaner.dir, PathBuf::from("/app/data/tmp"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATA_DIR", "/mnt/store"),
            ("CACHE_MAX_ENTRIES", "250"),
            ("CACHE_DEFAULT_TTL", "10"),
            ("MONITOR_INTERVAL", "5"),
            ("MONITOR_ACTION_TIMEOUT", "12"),
            ("MONITOR_DISK_THRESHOLD", "0.95"),
            ("TEMP_DIR", "/scratch"),
        ]));
        assert_eq!(config.monitor.disk_path, PathBuf::from("/mnt/store"));
        assert_eq!(config.cache.max_entries, 250);
        assert_eq!(config.cache.default_ttl, Duration::from_secs(10));
        assert_eq!(config.monitor.interval, Duration::from_secs(5));
        assert_eq!(config.monitor.action_timeout, Duration::from_secs(12));
        assert_eq!(config.monitor.thresholds.disk, 0.95);
        assert_eq!(config.monitor.thresholds.memory, 0.85);
        assert_eq!(config.cleaner.dir, PathBuf::from("/scratch"));
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("CACHE_MAX_ENTRIES", "lots"),
            ("MONITOR_CPU_THRESHOLD", "high"),
            ("MONITOR_INTERVAL", "0"),
        ]));
        assert_eq!(config.cache.max_entries, 1000);
        assert_eq!(config.monitor.interval, Duration::from_secs(30));
        assert_eq!(config.monitor.thresholds.cpu, 0.70);
    }
}
