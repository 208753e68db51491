//! Storage Module
//!
//! The temp-storage collaborator the resource monitor calls under disk pressure.

mod temp_dir;

use async_trait::async_trait;

pub use temp_dir::{CleanupSummary, TempDirCleaner};

// == Temp Storage Cleaner ==
/// Removes temporary files to relieve disk pressure.
///
/// Implementations must be idempotent: calling with nothing to clean is a
/// successful no-op.
#[async_trait]
pub trait TempStorageCleaner: Send + Sync {
    async fn cleanup_temp_files(&self) -> anyhow::Result<()>;
}
