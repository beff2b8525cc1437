//! Path management for coveo-backup
//!
//! Resolves where archives, logs and settings live.
//!
//! ## Path Resolution Order
//!
//! 1. `COVEO_BACKUP_DIR` environment variable (if set)
//! 2. The current working directory (the backup repository checkout)

use std::path::PathBuf;

use crate::error::BackupError;

/// Environment variable overriding the base directory
pub const BASE_DIR_ENV: &str = "COVEO_BACKUP_DIR";

/// Environment variable overriding the repository root
pub const REPO_DIR_ENV: &str = "COVEO_BACKUP_REPO";

/// Manages all paths used by coveo-backup
#[derive(Debug, Clone)]
pub struct BackupPaths {
    /// Base directory for archives, logs and settings
    base_dir: PathBuf,
    /// Root of the git repository the archives are committed to
    repo_root: PathBuf,
}

impl BackupPaths {
    /// Create a new BackupPaths instance
    ///
    /// Path resolution:
    /// 1. `COVEO_BACKUP_DIR` env var (explicit override)
    /// 2. Current working directory
    ///
    /// The repository root is `COVEO_BACKUP_REPO` if set, otherwise the base
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn new() -> Result<Self, BackupError> {
        let base_dir = match std::env::var(BASE_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => std::env::current_dir().map_err(|e| {
                BackupError::Config(format!("Could not determine current directory: {}", e))
            })?,
        };

        let repo_root = match std::env::var(REPO_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => base_dir.clone(),
        };

        Ok(Self {
            base_dir,
            repo_root,
        })
    }

    /// Create BackupPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            repo_root: base_dir.clone(),
            base_dir,
        }
    }

    /// Use a different repository root
    pub fn with_repo_root(mut self, repo_root: PathBuf) -> Self {
        self.repo_root = repo_root;
        self
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the repository root
    pub fn repo_root(&self) -> &PathBuf {
        &self.repo_root
    }

    /// Get the managed archive directory (<base>/snapshots/)
    pub fn archive_dir(&self) -> PathBuf {
        self.base_dir.join("snapshots")
    }

    /// Get the directory exports land in before promotion (<base>/snapshots/.pending/)
    pub fn pending_dir(&self) -> PathBuf {
        self.archive_dir().join(".pending")
    }

    /// Get the log directory (<base>/logs/)
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the path to the optional settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("coveo-backup.json")
    }

    /// Get the path to the run journal
    pub fn journal_file(&self) -> PathBuf {
        self.logs_dir().join("runs.jsonl")
    }

    /// Get the path to the run lock file
    pub fn lock_file(&self) -> PathBuf {
        self.archive_dir().join(".backup.lock")
    }

    /// Ensure all required directories exist
    ///
    /// Creates the archive, pending and log directories.
    pub fn ensure_directories(&self) -> Result<(), BackupError> {
        std::fs::create_dir_all(self.archive_dir())
            .map_err(|e| BackupError::Io(format!("Failed to create archive directory: {}", e)))?;

        std::fs::create_dir_all(self.pending_dir())
            .map_err(|e| BackupError::Io(format!("Failed to create pending directory: {}", e)))?;

        std::fs::create_dir_all(self.logs_dir())
            .map_err(|e| BackupError::Io(format!("Failed to create log directory: {}", e)))?;

        Ok(())
    }
}
