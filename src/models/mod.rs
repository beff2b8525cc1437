//! Core data models for coveo-backup
//!
//! Snapshot identity and readiness as reported by the platform, and the
//! resource categories a snapshot can export.

pub mod ids;
pub mod resource;
pub mod snapshot;

pub use ids::{RunId, SnapshotId};
pub use resource::{ResourceCategory, ResourceSelection};
pub use snapshot::{Snapshot, SnapshotStatus};
