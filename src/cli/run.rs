//! Backup run and configuration commands

use std::process::ExitCode;

use tracing::{error, info};

use crate::backup::{run_backup, RunOutcome};
use crate::config::{BackupConfig, BackupPaths, Settings, API_KEY_ENV, ORGANIZATION_ID_ENV};
use crate::error::BackupResult;

/// Load settings from the settings file and the environment
fn resolve_settings(paths: &BackupPaths) -> BackupResult<Settings> {
    let mut settings = Settings::load_or_default(paths)?;
    settings.apply_env()?;
    settings.validate()?;
    Ok(settings)
}

/// Run one backup cycle; exit status 0 only when the run fully succeeded
pub fn handle_run(
    paths: &BackupPaths,
    organization_id: Option<String>,
    api_key: Option<String>,
) -> ExitCode {
    let config = match resolve_settings(paths)
        .and_then(|settings| BackupConfig::new(organization_id, api_key, paths.clone(), settings))
    {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Cannot start backup run");
            return ExitCode::FAILURE;
        }
    };

    // run_backup logs its own failures
    let Ok(outcome) = run_backup(&config) else {
        return ExitCode::FAILURE;
    };

    match &outcome {
        RunOutcome::Kept {
            archive,
            commit: Some(commit),
            ..
        } => info!(archive = %archive.display(), commit = commit.short_id(), "Backup completed"),
        RunOutcome::Kept {
            archive,
            commit: None,
            ..
        } => error!(archive = %archive.display(), "Backup archived but not committed"),
        RunOutcome::Discarded { baseline, .. } => {
            info!(baseline = %baseline.display(), "Backup completed; configuration unchanged")
        }
    }

    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Show resolved paths and settings
pub fn handle_config(
    paths: &BackupPaths,
    organization_id: Option<&str>,
    api_key_set: bool,
) -> BackupResult<()> {
    let settings = resolve_settings(paths)?;

    println!("coveo-backup Configuration");
    println!("==========================");
    println!("Base directory:    {}", paths.base_dir().display());
    println!("Archive directory: {}", paths.archive_dir().display());
    println!("Repository root:   {}", paths.repo_root().display());
    println!("Logs directory:    {}", paths.logs_dir().display());
    println!("Settings file:     {}", paths.settings_file().display());
    println!();
    println!("Credentials:");
    println!(
        "  {}: {}",
        ORGANIZATION_ID_ENV,
        organization_id.unwrap_or("(not set)")
    );
    println!(
        "  {}: {}",
        API_KEY_ENV,
        if api_key_set { "(set, hidden)" } else { "(not set)" }
    );
    println!();
    println!("Settings:");
    println!("  Platform URL:       {}", settings.platform_url);
    println!(
        "  Polling:            every {}s, at most {} checks",
        settings.poll_interval_secs, settings.max_poll_attempts
    );
    println!("  Request timeout:    {}s", settings.request_timeout_secs);
    println!(
        "  Include children:   {}",
        settings.include_children_resources
    );
    println!(
        "  Resources:          {}",
        settings
            .resource_categories
            .categories()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}
