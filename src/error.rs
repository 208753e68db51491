//! Error types for the resource monitor
//!
//! Cache operations are total and have no error type; only host probing can fail.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// == Monitor Error Enum ==
/// Errors raised while sampling host metrics.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Filesystem statistics could not be read for the configured path
    #[error("Failed to probe filesystem at {}: {source}", .path.display())]
    DiskProbe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No mounted filesystem contains the configured path
    #[error("No mounted filesystem contains {}", .0.display())]
    NoFilesystem(PathBuf),

    /// A blocking probe did not finish within the configured timeout
    #[error("Probe timed out after {0:?}")]
    ProbeTimeout(Duration),

    /// The blocking probe task panicked or was cancelled
    #[error("Probe task failed: {0}")]
    ProbeTask(String),
}

// == Result Type Alias ==
/// Convenience Result type for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_probe_message_includes_path() {
        let err = MonitorError::DiskProbe {
            path: PathBuf::from("/srv/data"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/srv/data"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_timeout_message() {
        let err = MonitorError::ProbeTimeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Probe timed out after 5s");
    }
}
