//! Observable sync state
//!
//! A plain snapshot struct published through a `tokio::sync::watch`
//! channel. Readers never block the coordinator; they either take a copy
//! or await the next change.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::SyncError;

/// Snapshot of the coordinator's transient state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncState {
    /// Local records not yet confirmed by the remote store
    /// (`local`, `modified` and `deleted`)
    pub pending_sync_count: u64,
    /// Error of the most recent pass; cleared when a new pass starts
    pub sync_error: Option<SyncError>,
    /// Whether a pass is running right now
    pub is_syncing: bool,
    /// Upload timestamp of the last pass that ran to completion
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Tombstones whose remote delete failed in the last pass
    pub failed_deletions: usize,
}

impl SyncState {
    /// Returns true if there is nothing left to send
    pub fn is_clean(&self) -> bool {
        self.pending_sync_count == 0 && self.sync_error.is_none()
    }
}
