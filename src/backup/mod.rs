//! Backup workflow for coveo-backup
//!
//! # Architecture
//!
//! - `ArchiveStore`: permanent archives, the pending area and the retained
//!   reference (newest archive by name)
//! - `BackupRunner`: one run from snapshot creation to remote cleanup, generic
//!   over the platform (`SnapshotApi`) and version control (`Committer`)
//! - `run_backup`: wires the real collaborators, holds the run lock and
//!   records the run in the journal
//!
//! # Example
//!
//! ```rust,ignore
//! use coveo_backup::backup::run_backup;
//!
//! let outcome = run_backup(&config)?;
//! if !outcome.is_success() {
//!     std::process::exit(1);
//! }
//! ```

mod runner;
mod store;

pub use runner::{BackupRunner, ExportDecision, RunOutcome};
pub use store::{parse_snapshot_timestamp, ArchiveInfo, ArchiveStore, ARCHIVE_EXTENSION};

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::BackupConfig;
use crate::error::BackupResult;
use crate::journal::{RunJournal, RunRecord, RunStatus};
use crate::models::RunId;
use crate::remote::{PlatformClient, PollPolicy};
use crate::storage::RunLock;
use crate::vcs::GitCommitter;

/// Run one backup cycle against the configured organization
///
/// Failures are logged here before being returned, and every run, failed or
/// not, is appended to the run journal.
pub fn run_backup(config: &BackupConfig) -> BackupResult<RunOutcome> {
    let run_id = RunId::new();
    let mut record = RunRecord::begin(run_id, Utc::now());
    info!(run_id = %run_id, organization = %config.organization_id, "Starting backup run");

    let result = execute(config);

    record.finished_at = Utc::now();
    match &result {
        Ok(outcome) => {
            record.snapshot_id = Some(outcome.snapshot_id().clone());
            match outcome {
                RunOutcome::Kept {
                    archive, commit, ..
                } => {
                    record.status = RunStatus::Kept;
                    record.archive = Some(archive.clone());
                    record.commit = commit.as_ref().map(|c| c.id.clone());
                    if commit.is_none() {
                        record.error = Some("archive kept but not committed".to_string());
                    }
                }
                RunOutcome::Discarded { baseline, .. } => {
                    record.status = RunStatus::Discarded;
                    record.archive = Some(baseline.clone());
                }
            }
        }
        Err(e) => {
            error!(run_id = %run_id, error = %e, "Backup run failed");
            record.error = Some(e.to_string());
        }
    }

    let journal = RunJournal::new(config.paths.journal_file());
    if let Err(e) = journal.append(&record) {
        warn!(journal = %journal.path().display(), error = %e, "Failed to record run");
    }

    result
}

fn execute(config: &BackupConfig) -> BackupResult<RunOutcome> {
    config.paths.ensure_directories()?;
    let _lock = RunLock::acquire(&config.paths.lock_file())?;

    let client = PlatformClient::from_config(config)?;
    let committer = GitCommitter::new();
    let store = ArchiveStore::new(&config.paths);

    BackupRunner::new(&client, &committer, store, config.paths.repo_root().clone())
        .with_resources(config.settings.resource_categories.clone())
        .with_poll_policy(PollPolicy::from_settings(&config.settings))
        .run(Utc::now())
}
