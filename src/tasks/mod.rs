//! Background Tasks Module
//!
//! Periodic tasks that run for the lifetime of the process, each stopped by
//! cancelling its `CancellationToken`.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache entries at configured intervals
//! - Resource monitor: samples the host and applies corrective actions

mod monitor;
mod sweep;

use std::time::Duration;

/// Shortest period a background task will run at; tokio intervals reject zero
const MIN_PERIOD: Duration = Duration::from_millis(1);

pub use monitor::spawn_monitor_task;
pub use sweep::spawn_sweep_task;
