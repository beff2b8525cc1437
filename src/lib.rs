//! coveo-backup - Scheduled configuration backup for a Coveo organization
//!
//! Each run asks the platform for a snapshot of the organization's
//! configuration, waits for it, downloads it, and keeps it only when it
//! differs from the most recent retained archive. Kept archives are committed
//! to a git repository; the remote snapshot is always deleted afterwards.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution, settings and the run configuration
//! - `error`: Custom error types
//! - `models`: Snapshot identity, status and resource categories
//! - `remote`: Snapshot API trait and its HTTP client
//! - `archive`: Archive content comparison and change summaries
//! - `storage`: Atomic file writes and the run lock
//! - `vcs`: Committing kept archives with git
//! - `backup`: Archive store and the run orchestrator
//! - `journal`: Append-only record of past runs
//! - `logging`: Console and rolling file logging
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use coveo_backup::backup::run_backup;
//! use coveo_backup::config::{BackupConfig, BackupPaths, Settings};
//!
//! let paths = BackupPaths::new()?;
//! let settings = Settings::load_or_default(&paths)?;
//! let config = BackupConfig::new(org_id, api_key, paths, settings)?;
//! let outcome = run_backup(&config)?;
//! ```

pub mod archive;
pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod journal;
pub mod logging;
pub mod models;
pub mod remote;
pub mod storage;
pub mod vcs;

pub use error::{BackupError, BackupResult};
