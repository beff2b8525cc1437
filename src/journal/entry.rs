//! Run journal entry

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{RunId, SnapshotId};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// New archive kept (and committed unless `commit` is empty)
    Kept,
    /// Export matched the retained reference and was dropped
    Discarded,
    /// The run aborted
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kept => write!(f, "kept"),
            Self::Discarded => write!(f, "discarded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One line of the run journal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<SnapshotId>,

    /// Kept archive, or the baseline a discarded export matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    /// Start a record for a run beginning now
    pub fn begin(run_id: RunId, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: started_at,
            status: RunStatus::Failed,
            snapshot_id: None,
            archive: None,
            commit: None,
            error: None,
        }
    }

    /// One-line description for listings
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "{} {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.status
        )];

        if let Some(archive) = &self.archive {
            if let Some(name) = archive.file_name() {
                parts.push(name.to_string_lossy().to_string());
            }
        }
        if let Some(commit) = &self.commit {
            parts.push(format!("commit {}", commit.chars().take(7).collect::<String>()));
        }
        if let Some(error) = &self.error {
            parts.push(format!("error: {}", error));
        }

        parts.join(" | ")
    }
}
