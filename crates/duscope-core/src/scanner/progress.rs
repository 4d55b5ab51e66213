//! Scan progress reporting and per-entry error types.
//!
//! Progress messages are lightweight counters sent from the scan thread to
//! the caller via a crossbeam channel; the tree itself travels only once,
//! inside the final [`ScanOutcome`](super::ScanOutcome).

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// A non-fatal error recorded during scanning.
///
/// These never abort the scan: the offending entry becomes a zero-size
/// error leaf and traversal continues with its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// A per-entry stat or read failure (typically access denied).
    #[error("cannot read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// A symlink or mount whose canonical target is already on the active
    /// ancestor path. The entry is recorded but never traversed.
    #[error("cycle detected at {}", path.display())]
    CycleDetected { path: PathBuf },
}

impl ScanError {
    /// The path the error was recorded for.
    pub fn path(&self) -> &Path {
        match self {
            ScanError::Io { path, .. } | ScanError::CycleDetected { path } => path,
        }
    }
}

/// Progress updates sent from the scan thread to the caller.
#[derive(Debug)]
pub enum ScanProgress {
    /// Periodic update with running totals.
    Update {
        files_found: u64,
        dirs_found: u64,
        /// Running total under the scan's preferred metric.
        total_size: u64,
        current_path: String,
    },
    /// A non-fatal error was recorded (also returned in the outcome).
    Error { error: ScanError },
    /// Scanning completed; the aggregated tree is in the outcome.
    Complete { duration: Duration, error_count: u64 },
    /// Scan was cancelled by the caller; a partial tree is in the outcome.
    Cancelled,
}
