//! Status command - Display synchronization status
//!
//! Shows the pending count, the number of stored payments per sync status
//! and whether a session is stored.

use anyhow::{Context, Result};
use clap::Args;

use paysync_core::domain::SyncStatus;
use paysync_core::ports::ILocalStore;

use super::App;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, app: &App, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let pending = app
            .coordinator
            .update_pending_sync_count()
            .await
            .context("Failed to count pending changes")?;
        let counts = app
            .local
            .count_by_status()
            .await
            .context("Failed to count payments")?;
        let session = app.auth.session().context("Failed to read session")?;

        let session_state = match &session {
            None => "signed out",
            Some(s) if s.is_expired() => "expired",
            Some(_) => "active",
        };

        if format.is_json() {
            let by_status: serde_json::Map<String, serde_json::Value> = SyncStatus::ALL
                .iter()
                .map(|status| {
                    let count = counts.get(status).copied().unwrap_or(0);
                    (status.as_str().to_string(), count.into())
                })
                .collect();
            formatter.print_json(&serde_json::json!({
                "pending_sync_count": pending,
                "by_status": by_status,
                "session": session_state,
                "user_id": session.as_ref().map(|s| s.user_id.to_string()),
            }));
            return Ok(());
        }

        if pending == 0 {
            formatter.success("Everything is synced");
        } else {
            formatter.warn(&format!("{pending} change(s) waiting to sync"));
        }
        for status in SyncStatus::ALL {
            let count = counts.get(&status).copied().unwrap_or(0);
            formatter.field(status.as_str(), &count.to_string());
        }
        match &session {
            Some(s) => formatter.field("Session", &format!("{session_state} ({})", s.user_id)),
            None => formatter.field("Session", session_state),
        }
        Ok(())
    }
}
