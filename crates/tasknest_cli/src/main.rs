//! TaskNest command-line front end.
//!
//! # Responsibility
//! - Compose logging, a file-backed store and the controller for one run.
//! - Map each subcommand onto exactly one controller operation.

mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::Command;
use log::info;
use std::path::PathBuf;
use tasknest_core::{default_log_level, init_logging, AppController, FileStore, ProjectStorage};

#[derive(Parser)]
#[command(name = "tasknest")]
#[command(version, about = "Projects, todos and checklists in a local JSON store")]
struct Cli {
    /// Directory holding the persisted project blob.
    #[arg(long, global = true, env = "TASKNEST_DATA_DIR", default_value = ".tasknest")]
    data_dir: PathBuf,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    #[arg(long, global = true, env = "TASKNEST_LOG_DIR")]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = default_log_level().to_string())]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        init_logging(&cli.log_level, log_dir).context("failed to initialize logging")?;
    }

    let store = FileStore::open(&cli.data_dir)
        .with_context(|| format!("cannot open data dir `{}`", cli.data_dir.display()))?;
    if matches!(cli.command, Command::Clear) {
        return commands::clear(store);
    }

    let mut controller = AppController::new(ProjectStorage::new(store));
    controller.init();
    info!(
        "event=cli_run module=cli status=start data_dir={}",
        cli.data_dir.display()
    );
    commands::run(&mut controller, cli.command)
}
