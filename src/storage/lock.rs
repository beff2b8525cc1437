//! Exclusive run lock
//!
//! Two runs racing on the archive directory could both pick the same
//! retained reference and commit duplicates. A run holds an exclusive
//! advisory lock on a file in the archive directory until it finishes.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::BackupError;

/// Held for the duration of a run; released on drop
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Take the lock without waiting
    ///
    /// # Errors
    ///
    /// Returns `BackupError::Lock` when another process holds it.
    pub fn acquire(path: &Path) -> Result<Self, BackupError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BackupError::Io(format!("Failed to create lock directory: {}", e)))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| BackupError::Io(format!("Failed to open lock file: {}", e)))?;

        file.try_lock_exclusive().map_err(|_| {
            BackupError::Lock(format!(
                "Another backup run holds {}",
                path.display()
            ))
        })?;

        // Informational only; the advisory lock is what matters
        let _ = file.set_len(0);
        let _ = writeln!(file, "{}", std::process::id());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
