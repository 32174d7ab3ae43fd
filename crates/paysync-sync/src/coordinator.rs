//! Sync coordinator
//!
//! The [`SyncCoordinator`] runs one bidirectional pass between the local
//! store and the remote store of the signed-in user.
//!
//! ## Pass Flow
//!
//! 1. **Authenticate**: resolve the current user; failures abort before any
//!    store is touched
//! 2. **Upload**: bulk-upsert every `local`/`modified` record, then mark the
//!    batch `synced` with the pass start timestamp (all or nothing)
//! 3. **Deletion**: delete each tombstone remotely, removing it locally on
//!    success (best effort, failures are reported and kept for retry)
//! 4. **Download**: merge the user's remote rows into the local store;
//!    records with uncommitted local changes win
//!
//! Completed phases stay committed when a later phase fails, and every phase
//! is safe to re-run, so the next pass is the retry.
//!
//! ## Concurrency
//!
//! Only one pass runs at a time. A caller arriving while a pass is in flight
//! waits for it and receives its result instead of starting another one.
//! Each phase holds the store lock while it reads and writes the local
//! store; [`PaymentLedger`](crate::PaymentLedger) edits take the same lock,
//! so they land between phases and never inside one.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use paysync_core::domain::{Payment, PaymentId, SyncStatus, UserId};
use paysync_core::ports::{
    IAuthProvider, IEventSink, ILocalStore, IRemoteStore, NoopEventSink, RemotePaymentDto,
    SyncEvent,
};

use crate::error::SyncError;
use crate::state::SyncState;

// ============================================================================
// SyncPhase
// ============================================================================

/// Steps of a sync pass, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Authenticate,
    Upload,
    Deletion,
    Download,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Authenticate => "authenticate",
            SyncPhase::Upload => "upload",
            SyncPhase::Deletion => "deletion",
            SyncPhase::Download => "download",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SyncReport
// ============================================================================

/// A tombstone whose remote delete failed during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionFailure {
    pub id: PaymentId,
    pub error: SyncError,
}

/// Summary of a pass that did not fail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    /// User the pass ran for
    pub user_id: UserId,
    /// Timestamp stamped on every record confirmed by this pass
    pub started_at: DateTime<Utc>,
    /// Records sent in the upload batch
    pub uploaded: usize,
    /// Tombstones confirmed remotely and removed locally
    pub remote_deleted: usize,
    /// Tombstones kept for the next pass
    pub deletion_failures: Vec<DeletionFailure>,
    /// Remote rows new to the local store
    pub inserted: usize,
    /// Synced local rows refreshed with different remote content
    pub updated: usize,
    /// Remote rows ignored because the local copy has uncommitted changes
    pub skipped_dirty: usize,
    /// Remote rows ignored because they fail validation
    pub rejected: usize,
    /// Set when the pass stopped early; names the last completed phase
    pub cancelled_after: Option<SyncPhase>,
    /// Pending count recomputed after the pass
    pub pending_after: u64,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl SyncReport {
    fn new(user_id: UserId, started_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            started_at,
            uploaded: 0,
            remote_deleted: 0,
            deletion_failures: Vec::new(),
            inserted: 0,
            updated: 0,
            skipped_dirty: 0,
            rejected: 0,
            cancelled_after: None,
            pending_after: 0,
            duration_ms: 0,
        }
    }

    /// Remote rows written to the local store
    pub fn downloaded(&self) -> usize {
        self.inserted + self.updated
    }

    /// Returns true if the pass ran every phase
    pub fn is_complete(&self) -> bool {
        self.cancelled_after.is_none()
    }
}

type PassResult = Result<SyncReport, SyncError>;

// ============================================================================
// SyncCoordinator
// ============================================================================

/// Orchestrates sync passes and owns the observable sync state
pub struct SyncCoordinator {
    local: Arc<dyn ILocalStore>,
    remote: Arc<dyn IRemoteStore>,
    auth: Arc<dyn IAuthProvider>,
    events: Arc<dyn IEventSink>,
    /// Held for a whole pass; caches the last result for joining callers
    pass_gate: Mutex<Option<PassResult>>,
    /// Number of completed passes
    generation: AtomicU64,
    /// Held by whoever writes the local store
    store_lock: Mutex<()>,
    state: watch::Sender<SyncState>,
}

impl SyncCoordinator {
    pub fn new(
        local: Arc<dyn ILocalStore>,
        remote: Arc<dyn IRemoteStore>,
        auth: Arc<dyn IAuthProvider>,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        Self {
            local,
            remote,
            auth,
            events: Arc::new(NoopEventSink),
            pass_gate: Mutex::new(None),
            generation: AtomicU64::new(0),
            store_lock: Mutex::new(()),
            state,
        }
    }

    /// Replaces the event sink
    pub fn with_event_sink(mut self, events: Arc<dyn IEventSink>) -> Self {
        self.events = events;
        self
    }

    // --- Observable state ---

    /// Returns a snapshot of the current state
    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn pending_sync_count(&self) -> u64 {
        self.state.borrow().pending_sync_count
    }

    pub fn sync_error(&self) -> Option<SyncError> {
        self.state.borrow().sync_error.clone()
    }

    // --- Operations ---

    /// Runs one full pass, or joins the pass already in flight
    pub async fn perform_sync(&self) -> Result<SyncReport, SyncError> {
        self.perform_sync_with_cancel(&CancellationToken::new()).await
    }

    /// Runs one full pass, stopping at the next phase boundary once `cancel`
    /// fires
    ///
    /// A cancelled pass is not an error: it returns the report of the phases
    /// that completed, with `cancelled_after` set. A caller that joins an
    /// in-flight pass gets that pass's result; its own token is not consulted.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn perform_sync_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let seen = self.generation.load(Ordering::Acquire);

        let mut gate = match self.pass_gate.try_lock() {
            Ok(gate) => gate,
            Err(_) => {
                debug!("Sync pass in flight, waiting for its result");
                let gate = self.pass_gate.lock().await;
                if self.generation.load(Ordering::Acquire) > seen {
                    if let Some(result) = gate.as_ref() {
                        return result.clone();
                    }
                }
                gate
            }
        };

        let result = self.run_pass(cancel).await;
        *gate = Some(result.clone());
        self.generation.fetch_add(1, Ordering::AcqRel);
        result
    }

    /// Removes every local payment
    ///
    /// Without `force` the call refuses while unsynced changes exist. Waits
    /// for an in-flight pass so that its download cannot repopulate the
    /// store afterwards.
    ///
    /// # Returns
    /// `true` if the store was cleared
    pub async fn clear_local_database(&self, force: bool) -> bool {
        let _gate = self.pass_gate.lock().await;
        let _store = self.store_lock.lock().await;

        if !force {
            match self.count_pending().await {
                Ok(0) => {}
                Ok(pending) => {
                    warn!(pending, "Refusing to clear local database with unsynced changes");
                    self.state.send_modify(|s| s.pending_sync_count = pending);
                    return false;
                }
                Err(e) => {
                    error!(error = %e, "Failed to count pending payments");
                    return false;
                }
            }
        }

        if let Err(e) = self.local.clear_all().await {
            error!(error = ?e, "Failed to clear local database");
            return false;
        }

        self.state.send_modify(|s| {
            s.pending_sync_count = 0;
            s.failed_deletions = 0;
        });
        info!(force, "Cleared local database");
        true
    }

    /// Recomputes the pending count from the local store and publishes it
    ///
    /// Reads only; neither store is written.
    pub async fn update_pending_sync_count(&self) -> Result<u64, SyncError> {
        let pending = self.count_pending().await?;
        self.state.send_modify(|s| s.pending_sync_count = pending);
        debug!(pending, "Updated pending sync count");
        Ok(pending)
    }

    // --- Shared with the ledger ---

    pub(crate) async fn lock_store(&self) -> MutexGuard<'_, ()> {
        self.store_lock.lock().await
    }

    pub(crate) fn local(&self) -> &dyn ILocalStore {
        self.local.as_ref()
    }

    pub(crate) fn events(&self) -> &dyn IEventSink {
        self.events.as_ref()
    }

    // --- Pass internals ---

    async fn run_pass(&self, cancel: &CancellationToken) -> PassResult {
        let clock = Instant::now();
        self.state.send_modify(|s| {
            s.is_syncing = true;
            s.sync_error = None;
        });
        let mut syncing = SyncingFlag {
            state: &self.state,
            finished: false,
        };

        let outcome = self.run_phases(cancel).await;
        let pending = self.count_pending().await;

        let result = match (outcome, &pending) {
            (Ok(mut report), Ok(count)) => {
                report.pending_after = *count;
                report.duration_ms = clock.elapsed().as_millis() as u64;
                Ok(report)
            }
            (Ok(_), Err(e)) => Err(e.clone()),
            (Err(e), _) => Err(e),
        };

        syncing.finished = true;
        self.state.send_modify(|s| {
            s.is_syncing = false;
            if let Ok(count) = &pending {
                s.pending_sync_count = *count;
            }
            match &result {
                Ok(report) => {
                    s.failed_deletions = report.deletion_failures.len();
                    if report.is_complete() {
                        s.last_synced_at = Some(report.started_at);
                    }
                }
                Err(e) => s.sync_error = Some(e.clone()),
            }
        });

        match &result {
            Ok(report) => {
                self.events.publish(SyncEvent::PassCompleted {
                    uploaded: report.uploaded,
                    remote_deleted: report.remote_deleted,
                    deletion_failures: report.deletion_failures.len(),
                    downloaded: report.downloaded(),
                    cancelled: !report.is_complete(),
                });
                info!(
                    user_id = %report.user_id,
                    uploaded = report.uploaded,
                    remote_deleted = report.remote_deleted,
                    deletion_failures = report.deletion_failures.len(),
                    downloaded = report.downloaded(),
                    pending = report.pending_after,
                    cancelled_after = ?report.cancelled_after,
                    duration_ms = report.duration_ms,
                    "Sync pass finished"
                );
            }
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "Sync pass failed");
            }
        }

        result
    }

    async fn run_phases(&self, cancel: &CancellationToken) -> PassResult {
        let user_id = self.auth.current_user_id().await?;
        let mut report = SyncReport::new(user_id, Utc::now());

        if cancel.is_cancelled() {
            return Ok(cancelled(report, SyncPhase::Authenticate));
        }

        self.upload(&mut report).await?;
        if cancel.is_cancelled() {
            return Ok(cancelled(report, SyncPhase::Upload));
        }

        self.delete_tombstones(&mut report).await?;
        if cancel.is_cancelled() {
            return Ok(cancelled(report, SyncPhase::Deletion));
        }

        self.download(&mut report).await?;
        Ok(report)
    }

    /// Upload phase
    ///
    /// The store lock is held across the remote call so that no local edit
    /// can land between reading the batch and marking it synced.
    async fn upload(&self, report: &mut SyncReport) -> Result<(), SyncError> {
        let _store = self.store_lock.lock().await;
        let started_at = Utc::now();
        report.started_at = started_at;

        let mut batch = Vec::new();
        for status in SyncStatus::ALL.into_iter().filter(SyncStatus::needs_upload) {
            batch.extend(self.fetch_local(status).await?);
        }
        if batch.is_empty() {
            debug!("Nothing to upload");
            return Ok(());
        }

        let rows: Vec<RemotePaymentDto> = batch
            .iter()
            .map(|payment| RemotePaymentDto::from_payment(report.user_id, payment))
            .collect();
        self.remote
            .upsert_many(&report.user_id, &rows)
            .await
            .map_err(|e| SyncError::from_remote(SyncPhase::Upload, e))?;

        for payment in &mut batch {
            payment.confirm_synced(started_at)?;
        }
        self.local
            .upsert_many(&batch)
            .await
            .map_err(SyncError::from_local)?;

        report.uploaded = batch.len();
        debug!(count = batch.len(), "Upload confirmed");
        self.events.publish(SyncEvent::Uploaded {
            ids: batch.iter().map(|p| *p.id()).collect(),
        });
        Ok(())
    }

    /// Deletion phase; remote failures are collected, not raised
    async fn delete_tombstones(&self, report: &mut SyncReport) -> Result<(), SyncError> {
        let _store = self.store_lock.lock().await;

        for tombstone in self.fetch_local(SyncStatus::Deleted).await? {
            let id = *tombstone.id();
            match self.remote.delete_by_id(&id).await {
                Ok(()) => {
                    self.local
                        .delete_by_id(&id)
                        .await
                        .map_err(SyncError::from_local)?;
                    report.remote_deleted += 1;
                    self.events.publish(SyncEvent::RemoteDeleted { id });
                }
                Err(e) => {
                    warn!(payment_id = %id, error = %e, "Remote delete failed, keeping tombstone");
                    report.deletion_failures.push(DeletionFailure {
                        id,
                        error: SyncError::from_remote(SyncPhase::Deletion, e),
                    });
                }
            }
        }
        Ok(())
    }

    /// Download phase
    ///
    /// The remote fetch happens before the store lock is taken; the merge
    /// decisions are made against the local state under the lock.
    async fn download(&self, report: &mut SyncReport) -> Result<(), SyncError> {
        let rows = self
            .remote
            .fetch_all_for_user(&report.user_id)
            .await
            .map_err(|e| SyncError::from_remote(SyncPhase::Download, e))?;

        let _store = self.store_lock.lock().await;
        let local: HashMap<PaymentId, Payment> = self
            .local
            .fetch_all()
            .await
            .map_err(SyncError::from_local)?
            .into_iter()
            .map(|payment| (*payment.id(), payment))
            .collect();

        let mut writes = Vec::new();
        for row in rows {
            let id = row.id;
            let remote = match row.into_synced_payment(report.started_at) {
                Ok(payment) => payment,
                Err(e) => {
                    warn!(payment_id = %id, error = %e, "Skipping invalid remote payment");
                    report.rejected += 1;
                    continue;
                }
            };

            match local.get(&id) {
                None => {
                    report.inserted += 1;
                    writes.push(remote);
                }
                Some(existing) if existing.sync_status().is_dirty() => {
                    debug!(payment_id = %id, status = %existing.sync_status(), "Local changes win");
                    report.skipped_dirty += 1;
                }
                Some(existing) if existing.same_content(&remote) => {}
                Some(_) => {
                    report.updated += 1;
                    writes.push(remote);
                }
            }
        }

        self.local
            .upsert_many(&writes)
            .await
            .map_err(SyncError::from_local)?;

        if !writes.is_empty() {
            self.events.publish(SyncEvent::Downloaded {
                inserted: report.inserted,
                updated: report.updated,
            });
        }
        debug!(
            inserted = report.inserted,
            updated = report.updated,
            skipped_dirty = report.skipped_dirty,
            rejected = report.rejected,
            "Download merged"
        );
        Ok(())
    }

    async fn fetch_local(&self, status: SyncStatus) -> Result<Vec<Payment>, SyncError> {
        self.local
            .fetch_by_status(status)
            .await
            .map_err(SyncError::from_local)
    }

    async fn count_pending(&self) -> Result<u64, SyncError> {
        let counts = self
            .local
            .count_by_status()
            .await
            .map_err(SyncError::from_local)?;
        Ok(counts
            .iter()
            .filter(|(status, _)| status.is_pending())
            .map(|(_, count)| count)
            .sum())
    }
}

/// Clears `is_syncing` if a pass future is dropped before it finishes
struct SyncingFlag<'a> {
    state: &'a watch::Sender<SyncState>,
    finished: bool,
}

impl Drop for SyncingFlag<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("Sync pass abandoned before completion");
        self.state.send_modify(|s| s.is_syncing = false);
    }
}

fn cancelled(mut report: SyncReport, after: SyncPhase) -> SyncReport {
    info!(after = %after, "Sync pass cancelled");
    report.cancelled_after = Some(after);
    report
}
