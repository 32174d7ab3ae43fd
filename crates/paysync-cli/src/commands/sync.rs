//! Sync command - Run one synchronization pass
//!
//! `paysync sync` uploads pending local changes, confirms tombstones and
//! merges the remote payments of the signed-in user, then prints the pass
//! report or the classified failure.

use anyhow::Result;
use clap::Args;

use paysync_sync::{SyncError, SyncReport};

use super::App;
use crate::output::{get_formatter, plural, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct SyncCommand {}

impl SyncCommand {
    pub async fn execute(&self, app: &App, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        match app.coordinator.perform_sync().await {
            Ok(report) => {
                if format.is_json() {
                    formatter.print_json(&serde_json::to_value(&report)?);
                } else {
                    print_report(&report, &*formatter);
                }
                Ok(())
            }
            Err(e) => {
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "success": false,
                        "error": e,
                        "transient": e.is_transient(),
                    }));
                } else {
                    formatter.error(&e.to_string());
                    if let Some(hint) = hint(&e) {
                        formatter.info(hint);
                    }
                }
                Err(anyhow::Error::new(e).context("Sync failed"))
            }
        }
    }
}

fn print_report(report: &SyncReport, formatter: &dyn OutputFormatter) {
    let changed = report.uploaded + report.remote_deleted + report.downloaded();
    if let Some(phase) = report.cancelled_after {
        formatter.warn(&format!("Sync cancelled after the {phase} phase"));
    } else if changed == 0 && report.deletion_failures.is_empty() {
        formatter.success("Already up to date");
    } else {
        formatter.success(&format!("Sync completed in {}ms", report.duration_ms));
    }

    if report.uploaded > 0 {
        formatter.field("Uploaded", &plural(report.uploaded, "payment"));
    }
    if report.remote_deleted > 0 {
        formatter.field("Deleted", &plural(report.remote_deleted, "payment"));
    }
    if report.inserted > 0 {
        formatter.field("New", &plural(report.inserted, "payment"));
    }
    if report.updated > 0 {
        formatter.field("Updated", &plural(report.updated, "payment"));
    }
    if report.skipped_dirty > 0 {
        formatter.field(
            "Kept local",
            &format!(
                "{} with unsynced edits",
                plural(report.skipped_dirty, "payment")
            ),
        );
    }
    if report.rejected > 0 {
        formatter.warn(&format!(
            "Ignored {} from the server",
            plural(report.rejected, "invalid payment")
        ));
    }
    for failure in &report.deletion_failures {
        formatter.warn(&format!(
            "Could not delete {} remotely ({}); will retry",
            failure.id, failure.error
        ));
    }
    formatter.field("Pending", &report.pending_after.to_string());
}

fn hint(error: &SyncError) -> Option<&'static str> {
    if error.requires_login() {
        return Some("Run 'paysync auth login' to sign in again.");
    }
    match error {
        SyncError::NetworkError(_) => Some("Local changes are kept; try again when online."),
        SyncError::DownloadFailed(_) => {
            Some("Uploads from this pass were committed; the next sync resumes the download.")
        }
        _ => None,
    }
}
