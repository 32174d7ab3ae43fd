//! Clear command - Wipe the local payment database
//!
//! Without `--force` the command refuses while unsynced changes exist.

use anyhow::{bail, Result};
use clap::Args;

use super::App;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Discard unsynced local changes too
    #[arg(long)]
    pub force: bool,
}

impl ClearCommand {
    pub async fn execute(&self, app: &App, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let cleared = app.coordinator.clear_local_database(self.force).await;
        let pending = app.coordinator.pending_sync_count();

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "cleared": cleared,
                "pending_sync_count": pending,
            }));
        }

        if cleared {
            formatter.success("Local database cleared");
            return Ok(());
        }
        if pending > 0 && !self.force {
            if !format.is_json() {
                formatter.error(&format!(
                    "{pending} unsynced change(s) would be lost; run 'paysync sync' first or pass --force"
                ));
            }
            bail!("Refusing to clear local database with unsynced changes");
        }
        bail!("Failed to clear local database")
    }
}
