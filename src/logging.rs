//! Logging setup
//!
//! Console output on stderr plus, for backup runs, a daily rolling
//! `backup.log` in the logs directory. The filter defaults to `info` and
//! honours `RUST_LOG`.

use std::io::IsTerminal;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log file name prefix; the appender adds the date
pub const LOG_FILE_NAME: &str = "backup.log";

/// Keeps the file writer flushing until dropped
pub struct LogGuard(#[allow(dead_code)] Option<WorkerGuard>);

/// Install the global subscriber
///
/// `logs_dir` enables the log file. When it cannot be opened the process
/// continues with console logging only.
pub fn init_logging(logs_dir: Option<&Path>, default_level: &str) -> anyhow::Result<LogGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false);

    let file_appender = logs_dir.map(|dir| {
        std::fs::create_dir_all(dir)
            .map_err(anyhow::Error::from)
            .and_then(|_| {
                RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .filename_prefix(LOG_FILE_NAME)
                    .build(dir)
                    .map_err(anyhow::Error::from)
            })
    });

    let (file_layer, guard, file_error) = match file_appender {
        Some(Ok(appender)) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard), None)
        }
        Some(Err(e)) => (None, None, Some(e)),
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    if let Some(dir) = logs_dir {
        match file_error {
            Some(e) => warn!(dir = %dir.display(), error = %e, "File logging disabled"),
            None => debug!(dir = %dir.display(), "Logging to {}", LOG_FILE_NAME),
        }
    }

    Ok(LogGuard(guard))
}
