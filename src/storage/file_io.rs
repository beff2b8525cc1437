//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't leave a partial file at the
//! destination on failure.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::BackupError;

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, BackupError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| BackupError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| BackupError::Json(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Sibling path used while a file is being written
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Write a file atomically (write to `<path>.part`, then rename)
///
/// `fill` receives a buffered writer over the partial file. The destination
/// is either the complete output or untouched; the partial file is removed on
/// every failure.
pub fn write_atomic<P, F>(path: P, fill: F) -> Result<u64, BackupError>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> Result<u64, BackupError>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            BackupError::Io(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Same directory as the destination so the rename stays atomic
    let temp_path = partial_path(path);

    let result = write_and_sync(&temp_path, fill).and_then(|written| {
        fs::rename(&temp_path, path)
            .map_err(|e| BackupError::Io(format!("Failed to rename temp file: {}", e)))?;
        Ok(written)
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn write_and_sync<F>(temp_path: &Path, fill: F) -> Result<u64, BackupError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<u64, BackupError>,
{
    let file = File::create(temp_path)
        .map_err(|e| BackupError::Io(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    let written = fill(&mut writer)?;

    writer
        .flush()
        .map_err(|e| BackupError::Io(format!("Failed to flush data: {}", e)))?;

    // Sync to disk before rename
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| BackupError::Io(format!("Failed to sync data: {}", e)))?;

    Ok(written)
}

/// Stream everything from `reader` into `path` atomically
pub fn copy_atomic<P, R>(path: P, reader: &mut R) -> Result<u64, BackupError>
where
    P: AsRef<Path>,
    R: Read,
{
    write_atomic(path, |writer| {
        io::copy(reader, writer).map_err(|e| BackupError::Io(format!("Failed to write data: {}", e)))
    })
}
