//! Archive inspection commands
//!
//! Read-only views over the retained archives and the run journal.

use std::path::Path;
use std::process::ExitCode;

use crate::archive::{contents_equal, read_config_document, summarize_changes};
use crate::backup::ArchiveStore;
use crate::config::BackupPaths;
use crate::error::BackupResult;
use crate::journal::RunJournal;

/// List retained archives, newest first
pub fn handle_list(paths: &BackupPaths, verbose: bool) -> BackupResult<()> {
    let store = ArchiveStore::new(paths);
    let archives = store.list_archives()?;

    if archives.is_empty() {
        println!("No snapshots found in {}", store.archive_dir().display());
        println!("Create one with: coveo-backup run");
        return Ok(());
    }

    println!("Retained Snapshots");
    println!("==================");
    println!();

    for (i, archive) in archives.iter().enumerate() {
        let age = chrono::Utc::now().signed_duration_since(archive.created_at);
        let latest_marker = if i == 0 { " [latest]" } else { "" };

        if verbose {
            println!(
                "{}. {}{}\n   Created: {}\n   Size: {}\n   Age: {}\n   Path: {}\n",
                i + 1,
                archive.filename,
                latest_marker,
                archive.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                format_size(archive.size_bytes),
                format_duration(age),
                archive.path.display(),
            );
        } else {
            println!(
                "  {}. {} ({} ago, {}){}",
                i + 1,
                archive.filename,
                format_duration(age),
                format_size(archive.size_bytes),
                latest_marker,
            );
        }
    }

    println!();
    println!("Total: {} snapshot(s)", archives.len());
    Ok(())
}

/// Compare two archives; exit status 0 when identical, 1 otherwise
pub fn handle_compare(first: &Path, second: &Path) -> ExitCode {
    if contents_equal(first, second) {
        println!("identical");
        return ExitCode::SUCCESS;
    }

    println!("different");
    if let (Ok(before), Ok(after)) = (read_config_document(first), read_config_document(second)) {
        for change in summarize_changes(&before, &after) {
            println!("  {}", change);
        }
    }
    ExitCode::FAILURE
}

/// Show the most recent runs from the journal
pub fn handle_history(paths: &BackupPaths, limit: usize) -> BackupResult<()> {
    let journal = RunJournal::new(paths.journal_file());
    let records = journal.read_recent(limit)?;

    if records.is_empty() {
        println!("No runs recorded yet.");
        return Ok(());
    }

    for record in records.iter().rev() {
        println!("{}", record.summary());
    }
    Ok(())
}

/// Format a duration in human-readable form
fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}

/// Format a file size in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
