//! Custom error types for coveo-backup
//!
//! This module defines the error hierarchy for a backup run using thiserror.
//! Every variant is fatal to the current run except `MalformedArchive`, which
//! the comparator folds into "not equal", and `Commit`, which the runner
//! reports without skipping remote cleanup.

use thiserror::Error;

/// The main error type for backup operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Missing or invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// A remote API call failed or returned something unusable
    #[error("Remote request '{operation}' failed: {message}")]
    RemoteRequest {
        operation: &'static str,
        message: String,
    },

    /// Downloading snapshot content failed
    #[error("Export error: {0}")]
    Export(String),

    /// The snapshot never reached COMPLETED
    #[error("Snapshot {snapshot_id} not ready after {attempts} status checks")]
    SnapshotTimeout { snapshot_id: String, attempts: u32 },

    /// The remote system reported the snapshot as FAILED
    #[error("Snapshot {0} failed on the remote side")]
    SnapshotFailed(String),

    /// Archive could not be opened or does not hold exactly one JSON document
    #[error("Malformed archive: {0}")]
    MalformedArchive(String),

    /// Version-control failure
    #[error("Commit error: {0}")]
    Commit(String),

    /// Another run holds the archive directory
    #[error("Lock error: {0}")]
    Lock(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

impl BackupError {
    /// Create a remote request error for the named operation
    pub fn remote(operation: &'static str, message: impl Into<String>) -> Self {
        Self::RemoteRequest {
            operation,
            message: message.into(),
        }
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a readiness timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::SnapshotTimeout { .. })
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<zip::result::ZipError> for BackupError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::MalformedArchive(err.to_string())
    }
}

impl From<git2::Error> for BackupError {
    fn from(err: git2::Error) -> Self {
        Self::Commit(err.message().to_string())
    }
}

/// Result type alias for backup operations
pub type BackupResult<T> = Result<T, BackupError>;
