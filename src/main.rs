use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use coveo_backup::cli::{handle_compare, handle_config, handle_history, handle_list, handle_run};
use coveo_backup::config::BackupPaths;
use coveo_backup::logging::init_logging;

#[derive(Parser)]
#[command(
    name = "coveo-backup",
    author = "Kaylee Beyene",
    version,
    about = "Scheduled backup of a Coveo organization's configuration",
    long_about = "coveo-backup snapshots a Coveo organization's configuration, keeps \
                  the export only when it differs from the latest retained snapshot, \
                  and commits kept snapshots to git. Run without a command to perform \
                  one backup cycle."
)]
struct Cli {
    /// Organization to back up
    #[arg(long, global = true, env = "COVEO_ORGANIZATION_ID")]
    organization_id: Option<String>,

    /// Platform API key
    #[arg(long, global = true, env = "COVEO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backup cycle (the default)
    Run,

    /// List retained snapshots, newest first
    #[command(alias = "ls")]
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Compare the configuration inside two snapshot archives
    Compare {
        /// First archive
        first: PathBuf,
        /// Second archive
        second: PathBuf,
    },

    /// Show recent backup runs
    History {
        /// Number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show current configuration and paths
    Config,
}

fn main() -> ExitCode {
    // A missing .env file is fine; the environment may already be set
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let paths = match BackupPaths::new() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let is_run = matches!(cli.command, None | Some(Commands::Run));
    let logs_dir = paths.logs_dir();
    let _log_guard = match init_logging(is_run.then_some(logs_dir.as_path()), "info") {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        None | Some(Commands::Run) => return handle_run(&paths, cli.organization_id, cli.api_key),
        Some(Commands::Compare { first, second }) => return handle_compare(&first, &second),
        Some(Commands::List { verbose }) => handle_list(&paths, verbose),
        Some(Commands::History { limit }) => handle_history(&paths, limit),
        Some(Commands::Config) => {
            handle_config(&paths, cli.organization_id.as_deref(), cli.api_key.is_some())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}
