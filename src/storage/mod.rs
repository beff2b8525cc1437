//! Local storage helpers
//!
//! Atomic file writes for downloaded archives and the exclusive lock that
//! keeps two runs from racing on the archive directory.

pub mod file_io;
pub mod lock;

pub use file_io::{copy_atomic, partial_path, read_json, write_atomic};
pub use lock::RunLock;
