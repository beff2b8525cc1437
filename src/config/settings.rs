//! Tunable settings for coveo-backup
//!
//! Settings come from an optional JSON file next to the archives and may be
//! overridden from the environment. Every field has a default so a run works
//! with no settings file at all.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::BackupPaths;
use crate::error::BackupError;
use crate::models::ResourceSelection;
use crate::storage::file_io::read_json;

pub const PLATFORM_URL_ENV: &str = "COVEO_PLATFORM_URL";
pub const POLL_INTERVAL_ENV: &str = "COVEO_POLL_INTERVAL_SECS";
pub const MAX_POLL_ATTEMPTS_ENV: &str = "COVEO_MAX_POLL_ATTEMPTS";
pub const RESOURCE_CATEGORIES_ENV: &str = "COVEO_RESOURCE_CATEGORIES";

/// Settings for a backup run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the platform REST API (without `/organizations/...`)
    #[serde(default = "default_platform_url")]
    pub platform_url: String,

    /// Seconds between snapshot status checks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Status checks before giving up on a snapshot
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Timeout applied to every HTTP request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether child resources are exported alongside their parents
    #[serde(default = "default_include_children")]
    pub include_children_resources: bool,

    /// Categories to export
    #[serde(default)]
    pub resource_categories: ResourceSelection,
}

fn default_platform_url() -> String {
    "https://platform-eu.cloud.coveo.com/rest".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_max_poll_attempts() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_include_children() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            platform_url: default_platform_url(),
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_attempts: default_max_poll_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
            include_children_resources: default_include_children(),
            resource_categories: ResourceSelection::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or use defaults if the file doesn't exist
    pub fn load_or_default(paths: &BackupPaths) -> Result<Self, BackupError> {
        let settings: Settings = read_json(paths.settings_file())
            .map_err(|e| BackupError::Config(format!("Failed to load settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), BackupError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), BackupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(PLATFORM_URL_ENV) {
            self.platform_url = url.trim().to_string();
        }

        if let Some(value) = get(POLL_INTERVAL_ENV) {
            self.poll_interval_secs = parse_number(POLL_INTERVAL_ENV, &value)?;
        }

        if let Some(value) = get(MAX_POLL_ATTEMPTS_ENV) {
            self.max_poll_attempts = parse_number(MAX_POLL_ATTEMPTS_ENV, &value)?;
        }

        if let Some(value) = get(RESOURCE_CATEGORIES_ENV) {
            self.resource_categories = ResourceSelection::parse_list(&value)?;
        }

        self.validate()
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<(), BackupError> {
        if self.max_poll_attempts == 0 {
            return Err(BackupError::Config(
                "max_poll_attempts must be at least 1".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(BackupError::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.resource_categories.is_empty() {
            return Err(BackupError::Config(
                "At least one resource category must be selected".into(),
            ));
        }
        if !self.platform_url.starts_with("http://") && !self.platform_url.starts_with("https://")
        {
            return Err(BackupError::Config(format!(
                "Invalid platform URL: {}",
                self.platform_url
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, BackupError> {
    value
        .trim()
        .parse()
        .map_err(|_| BackupError::Config(format!("{} must be a whole number, got '{}'", key, value)))
}
