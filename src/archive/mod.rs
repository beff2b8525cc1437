//! Snapshot archives
//!
//! Reading the configuration document out of an exported archive, deciding
//! whether two archives carry the same configuration, and summarizing what
//! changed between them.

mod compare;
mod diff;

pub use compare::{contents_equal, read_config_document};
pub use diff::summarize_changes;

#[cfg(test)]
pub(crate) use compare::test_support;
