//! Git committer backed by libgit2

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use git2::{Commit, Repository, Signature};
use tracing::{error, info};

use super::{commit_message, CommitInfo, Committer};
use crate::backup::parse_snapshot_timestamp;
use crate::error::{BackupError, BackupResult};

const FALLBACK_NAME: &str = "coveo-backup";
const FALLBACK_EMAIL: &str = "coveo-backup@localhost";

/// Commits archives with the repository's configured identity
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCommitter;

impl GitCommitter {
    pub fn new() -> Self {
        Self
    }

    /// Open the repository holding `file` and return the file's workdir-relative path
    fn locate(&self, file: &Path, repository_root: &Path) -> BackupResult<(Repository, PathBuf)> {
        let repo = Repository::discover(repository_root)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| BackupError::Commit("Repository has no working directory".into()))?
            .canonicalize()
            .map_err(|e| BackupError::Commit(format!("Failed to resolve repository path: {}", e)))?;

        let absolute = file.canonicalize().map_err(|e| {
            BackupError::Commit(format!("Failed to resolve {}: {}", file.display(), e))
        })?;

        let relative = absolute
            .strip_prefix(&workdir)
            .map_err(|_| {
                BackupError::Commit(format!(
                    "{} is outside repository {}",
                    file.display(),
                    workdir.display()
                ))
            })?
            .to_path_buf();

        Ok((repo, relative))
    }

    fn commit_file(&self, file: &Path, repository_root: &Path) -> BackupResult<CommitInfo> {
        let (repo, relative) = self.locate(file, repository_root)?;
        let relative = relative.as_path();

        let mut index = repo.index()?;
        index.add_path(relative)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let signature = repo
            .signature()
            .or_else(|_| Signature::now(FALLBACK_NAME, FALLBACK_EMAIL))?;

        // Unborn branch: this is the first commit
        let parent: Option<Commit> = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&Commit> = parent.iter().collect();

        let message = commit_message(archive_timestamp(relative), relative);
        let oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &message,
            &tree,
            &parents,
        )?;

        Ok(CommitInfo {
            id: oid.to_string(),
            message,
        })
    }
}

/// The run time encoded in a snapshot file name, so message and name agree
fn archive_timestamp(file: &Path) -> DateTime<Utc> {
    file.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(parse_snapshot_timestamp)
        .unwrap_or_else(Utc::now)
}

impl Committer for GitCommitter {
    fn commit(&self, file: &Path, repository_root: &Path) -> BackupResult<CommitInfo> {
        match self.commit_file(file, repository_root) {
            Ok(info) => {
                info!(commit = info.short_id(), message = %info.message, "Committed new snapshot");
                Ok(info)
            }
            Err(e) => {
                error!(file = %file.display(), repo = %repository_root.display(), error = %e, "Error committing snapshot");
                Err(e)
            }
        }
    }

    fn is_committed(&self, file: &Path, repository_root: &Path) -> BackupResult<bool> {
        let (repo, relative) = self.locate(file, repository_root)?;

        // Unborn branch: nothing is committed yet
        let Ok(head) = repo.head() else {
            return Ok(false);
        };
        let tree = head.peel_to_tree()?;
        Ok(tree.get_path(&relative).is_ok())
    }
}
