//! Archive store for coveo-backup
//!
//! Manages the directory of permanent snapshot archives. Archives are named
//! `snapshot_<YYYYMMDD>_<HHMMSS>.zip`, so the lexicographically greatest name
//! is also the newest one and serves as the retained reference without any
//! index file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::paths::BackupPaths;
use crate::error::{BackupError, BackupResult};

/// Archive file extension
pub const ARCHIVE_EXTENSION: &str = "zip";

const NAME_PREFIX: &str = "snapshot_";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Metadata about a stored archive
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveInfo {
    /// Archive filename
    pub filename: String,
    /// Full path to the archive
    pub path: PathBuf,
    /// Timestamp embedded in the name
    pub created_at: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Manages permanent archives and the pending area exports land in
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    /// Directory holding permanent archives
    archive_dir: PathBuf,
    /// Directory holding downloads not yet promoted
    pending_dir: PathBuf,
}

impl ArchiveStore {
    /// Create a new ArchiveStore
    pub fn new(paths: &BackupPaths) -> Self {
        Self {
            archive_dir: paths.archive_dir(),
            pending_dir: paths.pending_dir(),
        }
    }

    /// Snapshot name for a point in time: `snapshot_YYYYMMDD_HHMMSS`
    pub fn snapshot_name(timestamp: DateTime<Utc>) -> String {
        format!("{}{}", NAME_PREFIX, timestamp.format(TIMESTAMP_FORMAT))
    }

    /// Where an export is downloaded before it is compared
    pub fn pending_path(&self, name: &str) -> PathBuf {
        self.pending_dir
            .join(format!("{}.{}", name, ARCHIVE_EXTENSION))
    }

    /// Where a kept archive lives permanently
    pub fn permanent_path(&self, name: &str) -> PathBuf {
        self.archive_dir
            .join(format!("{}.{}", name, ARCHIVE_EXTENSION))
    }

    /// Get archive directory path
    pub fn archive_dir(&self) -> &PathBuf {
        &self.archive_dir
    }

    /// List all permanent archives, newest first
    ///
    /// Files that do not follow the naming convention are ignored.
    pub fn list_archives(&self) -> BackupResult<Vec<ArchiveInfo>> {
        if !self.archive_dir.exists() {
            return Ok(Vec::new());
        }

        let mut archives = Vec::new();

        for entry in fs::read_dir(&self.archive_dir).map_err(|e| {
            BackupError::Io(format!("Failed to read archive directory: {}", e))
        })? {
            let entry = entry
                .map_err(|e| BackupError::Io(format!("Failed to read directory entry: {}", e)))?;

            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(info) = parse_archive_info(&path) {
                archives.push(info);
            }
        }

        // Names sort the same way as timestamps
        archives.sort_by(|a, b| b.filename.cmp(&a.filename));

        Ok(archives)
    }

    /// The retained reference: the newest permanent archive, if any
    pub fn latest(&self) -> BackupResult<Option<ArchiveInfo>> {
        Ok(self.list_archives()?.into_iter().next())
    }

    /// Move a fully downloaded export to its permanent name
    ///
    /// Refuses to replace an existing archive.
    pub fn promote(&self, pending: &Path, name: &str) -> BackupResult<PathBuf> {
        fs::create_dir_all(&self.archive_dir).map_err(|e| {
            BackupError::Io(format!("Failed to create archive directory: {}", e))
        })?;

        let target = self.permanent_path(name);
        if target.exists() {
            return Err(BackupError::Io(format!(
                "Archive {} already exists",
                target.display()
            )));
        }

        fs::rename(pending, &target).map_err(|e| {
            BackupError::Io(format!(
                "Failed to move {} to {}: {}",
                pending.display(),
                target.display(),
                e
            ))
        })?;

        debug!(archive = %target.display(), "Promoted export to permanent archive");
        Ok(target)
    }

    /// Delete a pending export; a missing file is not an error
    pub fn discard(&self, pending: &Path) -> BackupResult<()> {
        match fs::remove_file(pending) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackupError::Io(format!(
                "Failed to delete {}: {}",
                pending.display(),
                e
            ))),
        }
    }
}

/// Parse archive info from a file following the naming convention
fn parse_archive_info(path: &Path) -> Option<ArchiveInfo> {
    let filename = path.file_name()?.to_str()?.to_string();
    let stem = filename.strip_suffix(&format!(".{}", ARCHIVE_EXTENSION))?;
    let created_at = parse_snapshot_timestamp(stem)?;
    let size_bytes = fs::metadata(path).ok()?.len();

    Some(ArchiveInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
    })
}

/// Parse the timestamp out of `snapshot_YYYYMMDD_HHMMSS`
pub fn parse_snapshot_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stamp = name.strip_prefix(NAME_PREFIX)?;

    // Exact shape only, so lexicographic order stays chronological
    let bytes = stamp.as_bytes();
    if bytes.len() != 15 || bytes[8] != b'_' {
        return None;
    }
    if !bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 8 || b.is_ascii_digit())
    {
        return None;
    }

    let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    Some(naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};
    use tempfile::TempDir;

    fn create_test_store() -> (ArchiveStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BackupPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        (ArchiveStore::new(&paths), temp_dir)
    }

    fn touch(path: &Path) {
        fs::write(path, b"zip").unwrap();
    }

    #[test]
    fn test_snapshot_name() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(ArchiveStore::snapshot_name(ts), "snapshot_20250101_120000");
    }

    #[test]
    fn test_parse_snapshot_timestamp() {
        let ts = parse_snapshot_timestamp("snapshot_20251127_143022").unwrap();
        assert_eq!(ts.year(), 2025);
        assert_eq!(ts.month(), 11);
        assert_eq!(ts.day(), 27);
        assert_eq!(ts.hour(), 14);

        assert!(parse_snapshot_timestamp("snapshot_2025112_143022").is_none());
        assert!(parse_snapshot_timestamp("snapshot_20251127-143022").is_none());
        assert!(parse_snapshot_timestamp("backup_20251127_143022").is_none());
        assert!(parse_snapshot_timestamp("snapshot_20251399_143022").is_none());
    }

    #[test]
    fn test_empty_archive_dir() {
        let (store, _temp) = create_test_store();

        assert!(store.list_archives().unwrap().is_empty());
        assert!(store.latest().unwrap().is_none());
    }

    #[test]
    fn test_missing_archive_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BackupPaths::with_base_dir(temp_dir.path().join("nowhere"));
        let store = ArchiveStore::new(&paths);

        assert!(store.latest().unwrap().is_none());
    }

    #[test]
    fn test_latest_is_greatest_name() {
        let (store, _temp) = create_test_store();
        touch(&store.permanent_path("snapshot_20250101_120000"));
        touch(&store.permanent_path("snapshot_20250101_130000"));
        touch(&store.permanent_path("snapshot_20241231_235959"));

        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest.filename, "snapshot_20250101_130000.zip");

        let all = store.list_archives().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].filename, "snapshot_20241231_235959.zip");
    }

    #[test]
    fn test_foreign_files_ignored() {
        let (store, _temp) = create_test_store();
        touch(&store.archive_dir().join("latest_snapshot.json"));
        touch(&store.archive_dir().join("snapshot_20990101_000000.zip.part"));
        touch(&store.archive_dir().join("snapshot_later.zip"));
        touch(&store.pending_path("snapshot_20990101_000000"));
        touch(&store.permanent_path("snapshot_20250101_120000"));

        let all = store.list_archives().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].filename, "snapshot_20250101_120000.zip");
    }

    #[test]
    fn test_promote_moves_file() {
        let (store, _temp) = create_test_store();
        let pending = store.pending_path("snapshot_20250101_120000");
        touch(&pending);

        let target = store.promote(&pending, "snapshot_20250101_120000").unwrap();

        assert!(!pending.exists());
        assert!(target.exists());
        assert_eq!(
            store.latest().unwrap().unwrap().path,
            store.permanent_path("snapshot_20250101_120000")
        );
    }

    #[test]
    fn test_promote_never_overwrites() {
        let (store, _temp) = create_test_store();
        let name = "snapshot_20250101_120000";
        fs::write(store.permanent_path(name), b"original").unwrap();
        let pending = store.pending_path(name);
        touch(&pending);

        assert!(store.promote(&pending, name).is_err());
        assert_eq!(fs::read(store.permanent_path(name)).unwrap(), b"original");
    }

    #[test]
    fn test_discard() {
        let (store, _temp) = create_test_store();
        let pending = store.pending_path("snapshot_20250101_120000");
        touch(&pending);

        store.discard(&pending).unwrap();
        assert!(!pending.exists());

        // Already gone is fine
        store.discard(&pending).unwrap();
    }
}
