//! Monitor Module
//!
//! Periodic host sampling and threshold-driven corrective actions.
//!
//! # Rules
//! - memory ratio above threshold: clear every watched cache
//! - cpu ratio above threshold: warn only
//! - disk ratio above threshold: clean temp files

mod probe;
mod resource;
pub mod rules;
mod snapshot;

pub use probe::{process_memory_bytes, SysinfoProbe, SystemProbe};
pub use resource::{ResourceMonitor, TickReport};
pub use rules::{Action, Thresholds};
pub use snapshot::{DiskUsage, MetricsSnapshot};
