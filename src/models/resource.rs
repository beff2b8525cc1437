//! Exportable resource categories
//!
//! A snapshot exports any subset of the organization's configuration. Each
//! category is toggled independently and carries a list of selectors, where
//! `*` selects every resource of that kind.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BackupError;

/// A named subset of organization configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceCategory {
    Field,
    Extension,
    QueryPipeline,
    MlModel,
    Subscription,
    Source,
    SecurityProvider,
    Catalog,
    SearchPage,
}

impl ResourceCategory {
    /// Every category the platform can export
    pub const ALL: [ResourceCategory; 9] = [
        Self::Field,
        Self::Extension,
        Self::QueryPipeline,
        Self::MlModel,
        Self::Subscription,
        Self::Source,
        Self::SecurityProvider,
        Self::Catalog,
        Self::SearchPage,
    ];

    /// Wire name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Field => "FIELD",
            Self::Extension => "EXTENSION",
            Self::QueryPipeline => "QUERY_PIPELINE",
            Self::MlModel => "ML_MODEL",
            Self::Subscription => "SUBSCRIPTION",
            Self::Source => "SOURCE",
            Self::SecurityProvider => "SECURITY_PROVIDER",
            Self::Catalog => "CATALOG",
            Self::SearchPage => "SEARCH_PAGE",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceCategory {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| BackupError::Config(format!("Unknown resource category: {}", s)))
    }
}

/// Which categories (and which resources within them) a snapshot exports
///
/// Serializes to the `resourcesToExport` object of the create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceSelection(BTreeMap<ResourceCategory, Vec<String>>);

impl ResourceSelection {
    /// Export everything in every category
    pub fn all() -> Self {
        Self::from_categories(ResourceCategory::ALL)
    }

    /// Export everything in the given categories only
    pub fn from_categories(categories: impl IntoIterator<Item = ResourceCategory>) -> Self {
        Self(
            categories
                .into_iter()
                .map(|c| (c, vec!["*".to_string()]))
                .collect(),
        )
    }

    /// Parse a comma-separated category list, e.g. `FIELD,QUERY_PIPELINE`
    pub fn parse_list(list: &str) -> Result<Self, BackupError> {
        let categories = list
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(ResourceCategory::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        if categories.is_empty() {
            return Err(BackupError::Config(
                "Resource category list is empty".into(),
            ));
        }

        Ok(Self::from_categories(categories))
    }

    /// Check whether a category is selected
    pub fn includes(&self, category: ResourceCategory) -> bool {
        self.0.get(&category).is_some_and(|s| !s.is_empty())
    }

    /// Selected categories in a stable order
    pub fn categories(&self) -> impl Iterator<Item = ResourceCategory> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|s| s.is_empty())
    }
}

impl Default for ResourceSelection {
    fn default() -> Self {
        Self::all()
    }
}
