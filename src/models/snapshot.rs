//! Snapshot model
//!
//! Mirrors the parts of the platform's snapshot resource a backup run needs:
//! identity, creation time and readiness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::SnapshotId;

/// Readiness of a remote snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotStatus {
    /// Requested but not yet built
    #[default]
    Pending,
    /// Content is ready for export
    Completed,
    /// The platform gave up building the snapshot
    Failed,
    /// Any intermediate status the platform reports (e.g. IN_PROGRESS)
    #[serde(other)]
    Other,
}

impl SnapshotStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Other => write!(f, "IN_PROGRESS"),
        }
    }
}

/// A snapshot as reported by the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Identifier assigned by the platform; status responses may omit it
    #[serde(default)]
    pub id: SnapshotId,

    /// When the platform created the snapshot
    #[serde(default, with = "epoch_millis")]
    pub created_date: Option<DateTime<Utc>>,

    /// Readiness
    #[serde(default)]
    pub status: SnapshotStatus,
}

/// The platform reports timestamps as milliseconds since the epoch
mod epoch_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_i64(ts.timestamp_millis()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let millis = Option::<i64>::deserialize(deserializer)?;
        Ok(millis.and_then(DateTime::from_timestamp_millis))
    }
}
