//! Run journal for coveo-backup
//!
//! Every backup run appends one line to `logs/runs.jsonl` describing how it
//! ended: which snapshot it created, whether the export was kept or
//! discarded, the commit it produced, or the error that stopped it. The
//! `history` command reads it back.

mod entry;
mod logger;

pub use entry::{RunRecord, RunStatus};
pub use logger::RunJournal;
