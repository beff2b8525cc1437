//! Snapshot archive comparison
//!
//! A snapshot archive is a zip container holding exactly one JSON document
//! with the exported configuration. Two archives are equal when their
//! documents are structurally equal; key order, whitespace and the member's
//! file name do not matter.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{BackupError, BackupResult};

/// Determine whether two archives hold the same configuration
///
/// Never fails: an archive that cannot be read or does not contain exactly
/// one JSON document compares as different, so the caller keeps the new
/// export rather than silently dropping it.
pub fn contents_equal(archive_a: &Path, archive_b: &Path) -> bool {
    let a = match read_config_document(archive_a) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(archive = %archive_a.display(), error = %e, "Treating unreadable archive as different");
            return false;
        }
    };

    let b = match read_config_document(archive_b) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(archive = %archive_b.display(), error = %e, "Treating unreadable archive as different");
            return false;
        }
    };

    // Maps compare by key and numbers by their exact text
    a == b
}

/// Extract and parse the single JSON document inside an archive
///
/// # Errors
///
/// `MalformedArchive` when the file is not a zip container, holds zero or
/// several `.json` members, or the member is not valid UTF-8 JSON. `Io` when
/// the file cannot be opened.
pub fn read_config_document(path: &Path) -> BackupResult<Value> {
    let file = File::open(path)
        .map_err(|e| BackupError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| {
        BackupError::MalformedArchive(format!("{} is not a readable archive: {}", path.display(), e))
    })?;

    let index = find_json_member(&mut archive, path)?;
    let mut member = archive.by_index(index)?;
    debug!(archive = %path.display(), member = member.name(), "Reading configuration document");

    let mut contents = String::new();
    member.read_to_string(&mut contents).map_err(|e| {
        BackupError::MalformedArchive(format!(
            "{} in {} is not UTF-8 text: {}",
            member.name(),
            path.display(),
            e
        ))
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        BackupError::MalformedArchive(format!(
            "{} in {} is not valid JSON: {}",
            member.name(),
            path.display(),
            e
        ))
    })
}

/// Locate the one member whose name ends in `.json`
fn find_json_member<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    path: &Path,
) -> BackupResult<usize> {
    let mut candidates = Vec::new();

    for index in 0..archive.len() {
        let member = archive.by_index_raw(index)?;
        if member.is_dir() {
            continue;
        }
        if member.name().to_ascii_lowercase().ends_with(".json") {
            candidates.push((index, member.name().to_string()));
        }
    }

    match candidates.as_slice() {
        [(index, _)] => Ok(*index),
        [] => Err(BackupError::MalformedArchive(format!(
            "{} contains no JSON document",
            path.display()
        ))),
        many => Err(BackupError::MalformedArchive(format!(
            "{} contains {} JSON documents: {}",
            path.display(),
            many.len(),
            many.iter()
                .map(|(_, name)| name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}
