//! Backup orchestration
//!
//! One run walks a fixed sequence:
//!
//! 1. create a remote snapshot
//! 2. wait until it is ready
//! 3. export it into the pending area
//! 4. discard it if it matches the retained reference, otherwise promote it
//!    to a permanent archive and commit it
//! 5. delete the remote snapshot, whatever happened in 2-4

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::store::ArchiveStore;
use crate::archive::{contents_equal, read_config_document, summarize_changes};
use crate::error::BackupResult;
use crate::models::{ResourceSelection, SnapshotId};
use crate::remote::{PollPolicy, SnapshotApi};
use crate::vcs::{CommitInfo, Committer};

/// What happened to a freshly exported archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportDecision {
    /// Content is new; the archive now lives at this permanent path
    Kept(PathBuf),
    /// Content matched the retained reference at this path; export deleted
    Discarded(PathBuf),
}

/// Result of a run that got as far as a decision
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Kept {
        snapshot_id: SnapshotId,
        archive: PathBuf,
        /// `None` when committing failed; the archive is still on disk
        commit: Option<CommitInfo>,
    },
    Discarded {
        snapshot_id: SnapshotId,
        baseline: PathBuf,
    },
}

impl RunOutcome {
    pub fn snapshot_id(&self) -> &SnapshotId {
        match self {
            Self::Kept { snapshot_id, .. } | Self::Discarded { snapshot_id, .. } => snapshot_id,
        }
    }

    /// Whether the run should be reported as successful
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Kept { commit: None, .. })
    }
}

/// Sequences one backup run over its collaborators
pub struct BackupRunner<'a, A, C> {
    api: &'a A,
    committer: &'a C,
    store: ArchiveStore,
    repo_root: PathBuf,
    resources: ResourceSelection,
    poll: PollPolicy,
}

impl<'a, A, C> BackupRunner<'a, A, C>
where
    A: SnapshotApi,
    C: Committer,
{
    /// Create a runner exporting every resource category with the default poll policy
    pub fn new(api: &'a A, committer: &'a C, store: ArchiveStore, repo_root: PathBuf) -> Self {
        Self {
            api,
            committer,
            store,
            repo_root,
            resources: ResourceSelection::all(),
            poll: PollPolicy::default(),
        }
    }

    pub fn with_resources(mut self, resources: ResourceSelection) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Run one backup cycle; `now` names the snapshot
    ///
    /// The remote snapshot is deleted on every path after it was created.
    /// A failed delete is logged and does not change the result.
    pub fn run(&self, now: DateTime<Utc>) -> BackupResult<RunOutcome> {
        let name = ArchiveStore::snapshot_name(now);

        let snapshot_id = self.api.create(&name, &self.resources)?;
        info!(snapshot_id = %snapshot_id, name = %name, "Created snapshot");

        let result = self.process(&snapshot_id, &name);
        self.cleanup_remote(&snapshot_id);
        result
    }

    fn process(&self, snapshot_id: &SnapshotId, name: &str) -> BackupResult<RunOutcome> {
        self.api.await_ready(snapshot_id, &self.poll)?;
        debug!(snapshot_id = %snapshot_id, "Snapshot ready");

        let pending = self.store.pending_path(name);
        self.api.export_content(snapshot_id, &pending)?;
        info!(snapshot_id = %snapshot_id, path = %pending.display(), "Exported new snapshot");

        let decision = match self.decide(&pending, name) {
            Ok(decision) => decision,
            Err(e) => {
                let _ = self.store.discard(&pending);
                return Err(e);
            }
        };

        match decision {
            ExportDecision::Discarded(baseline) => {
                self.check_baseline_committed(&baseline);
                Ok(RunOutcome::Discarded {
                    snapshot_id: snapshot_id.clone(),
                    baseline,
                })
            }
            ExportDecision::Kept(archive) => {
                let commit = match self.committer.commit(&archive, &self.repo_root) {
                    Ok(info) => Some(info),
                    Err(e) => {
                        error!(archive = %archive.display(), error = %e, "Archive kept but not committed");
                        None
                    }
                };

                Ok(RunOutcome::Kept {
                    snapshot_id: snapshot_id.clone(),
                    archive,
                    commit,
                })
            }
        }
    }

    /// Compare a pending export with the retained reference and act on it
    pub fn decide(&self, pending: &Path, name: &str) -> BackupResult<ExportDecision> {
        match self.store.latest()? {
            Some(baseline) if contents_equal(pending, &baseline.path) => {
                self.store.discard(pending)?;
                info!(
                    baseline = %baseline.filename,
                    "New snapshot is identical to the latest snapshot. Deleted redundant snapshot."
                );
                Ok(ExportDecision::Discarded(baseline.path))
            }
            Some(baseline) => {
                log_changes(&baseline.path, pending);
                let archive = self.store.promote(pending, name)?;
                info!(archive = %archive.display(), previous = %baseline.filename, "Configuration changed; keeping new snapshot");
                Ok(ExportDecision::Kept(archive))
            }
            None => {
                let archive = self.store.promote(pending, name)?;
                info!(archive = %archive.display(), "No previous snapshot found; keeping initial snapshot");
                Ok(ExportDecision::Kept(archive))
            }
        }
    }

    /// A kept archive whose commit failed stays the reference; say so on every run
    fn check_baseline_committed(&self, baseline: &Path) {
        match self.committer.is_committed(baseline, &self.repo_root) {
            Ok(true) => {}
            Ok(false) => warn!(
                baseline = %baseline.display(),
                "Latest snapshot is not committed to the repository"
            ),
            Err(e) => warn!(baseline = %baseline.display(), error = %e, "Could not check whether latest snapshot is committed"),
        }
    }

    fn cleanup_remote(&self, snapshot_id: &SnapshotId) {
        match self.api.delete(snapshot_id) {
            Ok(()) => debug!(snapshot_id = %snapshot_id, "Deleted remote snapshot"),
            Err(e) => warn!(snapshot_id = %snapshot_id, error = %e, "Failed to delete remote snapshot"),
        }
    }
}

/// Log which parts of the configuration moved, when both sides are readable
fn log_changes(baseline: &Path, pending: &Path) {
    let (Ok(before), Ok(after)) = (read_config_document(baseline), read_config_document(pending))
    else {
        return;
    };

    let changes = summarize_changes(&before, &after);
    info!(count = changes.len(), "Configuration changes since last snapshot");
    for change in changes {
        debug!("  {}", change);
    }
}
