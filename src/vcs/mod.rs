//! Version control for kept archives
//!
//! The backup workflow only needs one capability from version control:
//! stage a file and commit it. `GitCommitter` provides it through libgit2.

mod git;

use std::path::Path;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::error::BackupResult;

pub use git::GitCommitter;

/// A commit created for an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    /// Full commit hash
    pub id: String,
    /// Commit message
    pub message: String,
}

impl CommitInfo {
    /// Abbreviated hash for display
    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }
}

/// Stages a file and commits it
pub trait Committer {
    /// Commit `file`, which must live inside the repository at `repository_root`
    fn commit(&self, file: &Path, repository_root: &Path) -> BackupResult<CommitInfo>;

    /// Whether `file` is part of the current HEAD commit
    fn is_committed(&self, file: &Path, repository_root: &Path) -> BackupResult<bool>;
}

/// `Backup snapshot: 2025-01-01 12:00:00 - snapshot_20250101_120000.zip`
pub fn commit_message<Tz>(timestamp: DateTime<Tz>, file: &Path) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    format!(
        "Backup snapshot: {} - {}",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        name
    )
}
