//! Remote snapshot operations
//!
//! `SnapshotApi` is the seam between the backup workflow and the platform:
//! create a snapshot, check its status, download its content and delete it.
//! `PlatformClient` talks to the real REST API; tests substitute fakes.
//!
//! # Example
//!
//! ```rust,ignore
//! use coveo_backup::remote::{PlatformClient, PollPolicy, SnapshotApi};
//!
//! let client = PlatformClient::from_config(&config)?;
//! let id = client.create("snapshot_20250101_120000", &config.settings.resource_categories)?;
//! client.await_ready(&id, &PollPolicy::from_settings(&config.settings))?;
//! client.export_content(&id, &pending_path)?;
//! client.delete(&id)?;
//! ```

mod client;

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::config::Settings;
use crate::error::{BackupError, BackupResult};
use crate::models::{ResourceSelection, Snapshot, SnapshotId};

pub use client::{PlatformClient, USER_AGENT};

/// How long to wait for a snapshot to become ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between status checks
    pub interval: Duration,
    /// Status checks before giving up
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.poll_interval(), settings.max_poll_attempts)
    }

    /// Worst-case time spent waiting
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 10)
    }
}

/// Operations the backup workflow needs from the platform
pub trait SnapshotApi {
    /// Request a new snapshot exporting `resources`; returns its identifier
    fn create(&self, name: &str, resources: &ResourceSelection) -> BackupResult<SnapshotId>;

    /// Fetch the current state of a snapshot
    fn fetch_status(&self, id: &SnapshotId) -> BackupResult<Snapshot>;

    /// Download the snapshot archive to `destination`
    ///
    /// Implementations must never leave a partial file at `destination`.
    /// Returns the number of bytes written.
    fn export_content(&self, id: &SnapshotId, destination: &Path) -> BackupResult<u64>;

    /// Remove the snapshot from the platform
    fn delete(&self, id: &SnapshotId) -> BackupResult<()>;

    /// Poll until the snapshot reports COMPLETED
    ///
    /// Checks at most `policy.max_attempts` times, sleeping `policy.interval`
    /// between checks. A FAILED status stops immediately.
    ///
    /// # Errors
    ///
    /// `SnapshotTimeout` when attempts run out, `SnapshotFailed` on a FAILED
    /// status, or whatever `fetch_status` returns.
    fn await_ready(&self, id: &SnapshotId, policy: &PollPolicy) -> BackupResult<Snapshot> {
        for attempt in 1..=policy.max_attempts {
            let snapshot = self.fetch_status(id)?;
            debug!(snapshot_id = %id, attempt, status = %snapshot.status, "Polled snapshot status");

            if snapshot.status.is_ready() {
                return Ok(snapshot);
            }
            if snapshot.status.is_failed() {
                return Err(BackupError::SnapshotFailed(id.to_string()));
            }
            if attempt < policy.max_attempts {
                std::thread::sleep(policy.interval);
            }
        }

        Err(BackupError::SnapshotTimeout {
            snapshot_id: id.to_string(),
            attempts: policy.max_attempts,
        })
    }
}
