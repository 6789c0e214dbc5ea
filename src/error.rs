//! Error types for daybook

use crate::driver::AccessMode;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for daybook operations
pub type Result<T> = std::result::Result<T, DaybookError>;

/// daybook error types
#[derive(Error, Debug)]
pub enum DaybookError {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be decoded into a row
    #[error("Malformed row: {0}")]
    MalformedRow(String),

    /// Operation requested through a context opened in the other mode
    #[error("Driver context is open for {actual} access, not {requested}")]
    ModeConflict {
        requested: AccessMode,
        actual: AccessMode,
    },

    /// Operation requested through a closed context
    #[error("Driver context is closed")]
    ContextClosed,

    /// Per-file IO failure during repair
    #[error("Repair of {} failed: {source}", .path.display())]
    RepairIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid device id or a timestamp without a usable calendar date
    #[error("Path resolution failed: {0}")]
    PathResolution(String),
}

impl DaybookError {
    /// Check if the error indicates misuse of the API rather than a data or IO problem
    pub fn is_caller_bug(&self) -> bool {
        matches!(
            self,
            DaybookError::ModeConflict { .. } | DaybookError::ContextClosed
        )
    }

    /// Check if the error is local to one row or one file and the operation can continue
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DaybookError::MalformedRow(_) | DaybookError::RepairIo { .. }
        )
    }
}
