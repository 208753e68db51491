//! Threshold Rules Module
//!
//! Maps a metrics snapshot to the corrective actions a tick should take.

use std::fmt;

use serde::Serialize;

use crate::monitor::MetricsSnapshot;

// == Thresholds ==
/// Ratios above which each rule fires. Comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub memory: f64,
    pub cpu: f64,
    pub disk: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            memory: 0.85,
            cpu: 0.70,
            disk: 0.80,
        }
    }
}

// == Action ==
/// What a tick decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Memory pressure: drop every watched cache
    ClearCaches,
    /// CPU pressure: logged only, no corrective action exists
    ObserveCpu,
    /// Disk pressure: ask storage to remove temp files
    CleanupTempFiles,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::ClearCaches => write!(f, "clear_caches"),
            Action::ObserveCpu => write!(f, "observe_cpu"),
            Action::CleanupTempFiles => write!(f, "cleanup_temp_files"),
        }
    }
}

// == Evaluate ==
/// Evaluates every rule independently; several may fire in one tick.
pub fn evaluate(snapshot: &MetricsSnapshot, thresholds: &Thresholds) -> Vec<Action> {
    let mut actions = Vec::new();

    if snapshot.memory_usage_ratio > thresholds.memory {
        actions.push(Action::ClearCaches);
    }
    if snapshot.cpu_usage_ratio > thresholds.cpu {
        actions.push(Action::ObserveCpu);
    }
    if snapshot.disk_usage_ratio() > thresholds.disk {
        actions.push(Action::CleanupTempFiles);
    }

    actions
}
