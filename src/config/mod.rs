//! Configuration module for coveo-backup
//!
//! This module provides configuration management including:
//! - Path resolution for archives, logs and settings
//! - Optional settings file with environment overrides
//! - The run configuration assembled once at startup

pub mod paths;
pub mod settings;

use std::fmt;

pub use paths::BackupPaths;
pub use settings::Settings;

use crate::error::BackupError;

pub const ORGANIZATION_ID_ENV: &str = "COVEO_ORGANIZATION_ID";
pub const API_KEY_ENV: &str = "COVEO_API_KEY";

/// Bearer token for the platform API; never printed
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Everything a backup run needs, resolved up front
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Organization whose configuration is backed up
    pub organization_id: String,
    /// Credential for the platform API
    pub api_key: ApiKey,
    /// Where archives, logs and the repository live
    pub paths: BackupPaths,
    /// Tunables
    pub settings: Settings,
}

impl BackupConfig {
    /// Assemble the run configuration
    ///
    /// # Errors
    ///
    /// Returns `BackupError::Config` when the organization or the API key is
    /// missing or blank.
    pub fn new(
        organization_id: Option<String>,
        api_key: Option<String>,
        paths: BackupPaths,
        settings: Settings,
    ) -> Result<Self, BackupError> {
        let organization_id = required(ORGANIZATION_ID_ENV, organization_id)?;
        let api_key = required(API_KEY_ENV, api_key)?;

        Ok(Self {
            organization_id,
            api_key: ApiKey::new(api_key),
            paths,
            settings,
        })
    }
}

fn required(name: &str, value: Option<String>) -> Result<String, BackupError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BackupError::Config(format!("{} is not set in environment or .env file", name)))
}
