//! Watch command - Keep syncing until interrupted
//!
//! Runs the `SyncScheduler` in the foreground: one pass at start, then one
//! every `sync.poll_interval` seconds, until Ctrl-C. State changes are
//! printed as they are published.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use paysync_core::config::{Config, ConfigBuilder};
use paysync_sync::{SyncScheduler, SyncState};

use super::App;
use crate::output::{get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Seconds between passes (overrides sync.poll_interval)
    #[arg(long)]
    pub interval: Option<u64>,
}

impl WatchCommand {
    pub async fn execute(&self, app: &App, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        if !app.config.sync.auto_sync && self.interval.is_none() {
            formatter.warn("sync.auto_sync is disabled; pass --interval to watch anyway");
            return Ok(());
        }

        let interval = Duration::from_secs(self.poll_interval(&app.config)?);

        let scheduler = Arc::new(SyncScheduler::new(app.coordinator.clone(), interval));
        let runner = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.run().await })
        };
        formatter.info(&format!(
            "Syncing every {}s; press Ctrl-C to stop",
            interval.as_secs()
        ));

        let mut state = app.coordinator.subscribe();
        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Failed to listen for Ctrl-C")?;
                    break;
                }
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = state.borrow_and_update().clone();
                    if !snapshot.is_syncing {
                        print_state(&snapshot, format, &*formatter);
                    }
                }
            }
        }

        info!("Stopping sync scheduler");
        scheduler.shutdown();
        let passes = runner.await.context("Sync scheduler task failed")?;
        formatter.success(&format!("Stopped after {passes} pass(es)"));
        Ok(())
    }
}

impl WatchCommand {
    /// Applies `--interval` on top of the loaded config and revalidates
    fn poll_interval(&self, config: &Config) -> Result<u64> {
        let Some(seconds) = self.interval else {
            return Ok(config.sync.poll_interval);
        };
        let config = ConfigBuilder::from(config.clone())
            .sync_poll_interval(seconds)
            .build_validated()
            .map_err(|errors| {
                let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
                anyhow::anyhow!("Invalid --interval: {}", details.join("; "))
            })?;
        Ok(config.sync.poll_interval)
    }
}

fn print_state(state: &SyncState, format: OutputFormat, formatter: &dyn OutputFormatter) {
    if format.is_json() {
        if let Ok(value) = serde_json::to_value(state) {
            formatter.print_json(&value);
        }
        return;
    }
    match &state.sync_error {
        Some(error) => formatter.error(&error.to_string()),
        None => formatter.info(&format!(
            "{} pending, {} failed deletion(s)",
            state.pending_sync_count, state.failed_deletions
        )),
    }
}
