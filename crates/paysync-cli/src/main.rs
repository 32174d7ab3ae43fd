//! PaySync CLI - Command-line interface for PaySync
//!
//! Provides commands for:
//! - Recording, editing and removing payments offline
//! - Running a sync pass against the backend
//! - Viewing sync status
//! - Managing the stored session
//! - Syncing periodically in the foreground

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    auth::AuthCommand,
    clear::ClearCommand,
    payments::{AddCommand, EditCommand, ListCommand, RmCommand},
    status::StatusCommand,
    sync::SyncCommand,
    watch::WatchCommand,
    App,
};
use output::OutputFormat;
use paysync_core::config::Config;

#[derive(Debug, Parser)]
#[command(name = "paysync", version, about = "Offline-first payment tracker")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one sync pass now
    Sync(SyncCommand),
    /// Show synchronization status
    Status(StatusCommand),
    /// Record a new payment
    Add(AddCommand),
    /// List payments
    List(ListCommand),
    /// Change an existing payment
    Edit(EditCommand),
    /// Delete a payment
    Rm(RmCommand),
    /// Wipe the local database
    Clear(ClearCommand),
    /// Sync periodically until interrupted
    Watch(WatchCommand),
    /// Session commands
    #[command(subcommand)]
    Auth(AuthCommand),
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path()),
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", details.join("\n  "));
    }
    Ok(config)
}

/// `RUST_LOG` wins, then `-v`, then `logging.level` from the config
fn log_filter(verbose: u8, configured: &str) -> EnvFilter {
    let level = match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    // Logs go to stderr so `--json` output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose, &config.logging.level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let format = OutputFormat::from_json_flag(cli.json);
    let app = App::open(config).await?;

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&app, format).await,
        Commands::Status(cmd) => cmd.execute(&app, format).await,
        Commands::Add(cmd) => cmd.execute(&app, format).await,
        Commands::List(cmd) => cmd.execute(&app, format).await,
        Commands::Edit(cmd) => cmd.execute(&app, format).await,
        Commands::Rm(cmd) => cmd.execute(&app, format).await,
        Commands::Clear(cmd) => cmd.execute(&app, format).await,
        Commands::Watch(cmd) => cmd.execute(&app, format).await,
        Commands::Auth(cmd) => cmd.execute(&app, format).await,
    }
}
