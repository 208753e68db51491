//! Temp Directory Cleaner Module
//!
//! Age-based cleanup of a single temp directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CleanerConfig;
use crate::storage::TempStorageCleaner;

// == Cleanup Summary ==
/// Result of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    /// Regular files inspected
    pub files_checked: usize,
    /// Files deleted
    pub files_removed: usize,
    /// Bytes reclaimed by the deleted files
    pub bytes_reclaimed: u64,
}

// == Temp Dir Cleaner ==
/// Deletes regular files in one directory that are older than `max_age`.
///
/// Subdirectories are left alone. A missing directory counts as clean.
#[derive(Debug, Clone)]
pub struct TempDirCleaner {
    dir: PathBuf,
    max_age: Duration,
}

impl TempDirCleaner {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    pub fn from_config(config: &CleanerConfig) -> Self {
        Self::new(config.dir.clone(), config.max_age)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Runs one pass and reports what was removed.
    ///
    /// Per-file failures are logged and skipped; only failing to read the
    /// directory itself is an error.
    pub async fn sweep(&self) -> anyhow::Result<CleanupSummary> {
        let mut summary = CleanupSummary::default();

        let Some(cutoff) = SystemTime::now().checked_sub(self.max_age) else {
            return Ok(summary);
        };

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "Temp directory does not exist, nothing to clean");
                return Ok(summary);
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read temp directory {}", self.dir.display())
                });
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("failed to list temp directory {}", self.dir.display()))?
        {
            let path = entry.path();
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to stat temp file");
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }
            summary.files_checked += 1;

            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Temp file has no modification time");
                    continue;
                }
            };
            if modified >= cutoff {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    summary.files_removed += 1;
                    summary.bytes_reclaimed += metadata.len();
                }
                // Removed concurrently by someone else
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove temp file");
                }
            }
        }

        Ok(summary)
    }
}

// == Temp Storage Cleaner ==
#[async_trait]
impl TempStorageCleaner for TempDirCleaner {
    async fn cleanup_temp_files(&self) -> anyhow::Result<()> {
        let summary = self.sweep().await?;
        info!(
            dir = %self.dir.display(),
            files_checked = summary.files_checked,
            files_removed = summary.files_removed,
            bytes_reclaimed = summary.bytes_reclaimed,
            "Temp file cleanup complete"
        );
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    async fn write_file(dir: &Path, name: &str, bytes: usize) {
        tokio::fs::write(dir.join(name), vec![0u8; bytes]).await.unwrap();
    }

    #[tokio::test]
    async fn test_removes_files_older_than_max_age() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.tmp", 10).await;
        write_file(dir.path(), "b.tmp", 20).await;
        tokio::fs::create_dir(dir.path().join("nested")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        let cleaner = TempDirCleaner::new(dir.path(), Duration::from_millis(10));
        let summary = cleaner.sweep().await.unwrap();

        assert_eq!(summary.files_checked, 2);
        assert_eq!(summary.files_removed, 2);
        assert_eq!(summary.bytes_reclaimed, 30);
        assert!(!dir.path().join("a.tmp").exists());
        assert!(dir.path().join("nested").exists());
    }

    #[tokio::test]
    async fn test_keeps_recent_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "fresh.tmp", 5).await;

        let cleaner = TempDirCleaner::new(dir.path(), Duration::from_secs(3600));
        let summary = cleaner.sweep().await.unwrap();

        assert_eq!(summary.files_checked, 1);
        assert_eq!(summary.files_removed, 0);
        assert!(dir.path().join("fresh.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_directory_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let cleaner = TempDirCleaner::new(dir.path().join("missing"), Duration::ZERO);

        assert_eq!(cleaner.sweep().await.unwrap(), CleanupSummary::default());
        assert_ok!(cleaner.cleanup_temp_files().await);
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "old.tmp", 1).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let cleaner = TempDirCleaner::new(dir.path(), Duration::from_millis(5));
        assert_ok!(cleaner.cleanup_temp_files().await);
        assert_ok!(cleaner.cleanup_temp_files().await);
        assert!(!dir.path().join("old.tmp").exists());
    }

    #[test]
    fn test_from_config() {
        let config = CleanerConfig {
            dir: PathBuf::from("/var/tmp/uploads"),
            max_age: Duration::from_secs(60),
        };
        let cleaner = TempDirCleaner::from_config(&config);
        assert_eq!(cleaner.dir(), Path::new("/var/tmp/uploads"));
    }
}
