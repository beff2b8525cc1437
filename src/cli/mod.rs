//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup workflow.

pub mod archives;
pub mod run;

pub use archives::{handle_compare, handle_history, handle_list};
pub use run::{handle_config, handle_run};
