//! Local payment edits
//!
//! [`PaymentLedger`] is the write path for presentation code. It applies the
//! sync status transitions itself, so callers never touch status fields:
//!
//! | Operation | Status effect                                          |
//! |-----------|--------------------------------------------------------|
//! | `create`  | new record as `local`                                  |
//! | `update`  | `synced` → `modified`; `local`/`modified` unchanged    |
//! | `delete`  | `local` removed at once; others tombstoned `deleted`   |
//!
//! Every write takes the coordinator's store lock, so it is ordered against
//! the phases of a running pass, and then republishes the pending count.

use std::sync::Arc;

use tracing::{debug, warn};

use paysync_core::domain::{Payment, PaymentDraft, PaymentEdit, PaymentId, SyncStatus};
use paysync_core::ports::SyncEvent;

use crate::coordinator::SyncCoordinator;
use crate::error::LedgerError;

/// Front door for local payment mutations
pub struct PaymentLedger {
    coordinator: Arc<SyncCoordinator>,
}

impl PaymentLedger {
    pub fn new(coordinator: Arc<SyncCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Stores a new payment with `local` status
    pub async fn create(&self, draft: PaymentDraft) -> Result<Payment, LedgerError> {
        let payment = Payment::new(draft)?;
        {
            let _store = self.coordinator.lock_store().await;
            self.coordinator.local().upsert(&payment).await?;
        }

        debug!(payment_id = %payment.id(), "Created payment");
        self.coordinator
            .events()
            .publish(SyncEvent::Created { id: *payment.id() });
        self.refresh_pending().await;
        Ok(payment)
    }

    /// Applies an edit and returns the updated payment
    ///
    /// An edit that changes nothing is not written and leaves the status
    /// alone.
    pub async fn update(&self, id: &PaymentId, edit: PaymentEdit) -> Result<Payment, LedgerError> {
        let (payment, changed) = {
            let _store = self.coordinator.lock_store().await;
            let mut payment = self.live(id).await?;
            let changed = payment.apply_edit(edit)?;
            if changed {
                self.coordinator.local().upsert(&payment).await?;
            }
            (payment, changed)
        };

        if changed {
            debug!(payment_id = %id, status = %payment.sync_status(), "Updated payment");
            self.coordinator
                .events()
                .publish(SyncEvent::Updated { id: *id });
            self.refresh_pending().await;
        }
        Ok(payment)
    }

    /// Marks a payment paid or unpaid
    pub async fn set_paid(&self, id: &PaymentId, is_paid: bool) -> Result<Payment, LedgerError> {
        let edit = PaymentEdit {
            is_paid: Some(is_paid),
            ..Default::default()
        };
        self.update(id, edit).await
    }

    /// Deletes a payment
    ///
    /// A payment that never reached the remote store is removed outright.
    /// Anything else is tombstoned until the next pass confirms the remote
    /// delete.
    pub async fn delete(&self, id: &PaymentId) -> Result<(), LedgerError> {
        {
            let _store = self.coordinator.lock_store().await;
            let mut payment = self.live(id).await?;
            if payment.sync_status() == SyncStatus::Local {
                self.coordinator.local().delete_by_id(id).await?;
                debug!(payment_id = %id, "Removed unsynced payment");
            } else {
                payment.mark_deleted()?;
                self.coordinator.local().upsert(&payment).await?;
                debug!(payment_id = %id, "Tombstoned payment");
            }
        }

        self.coordinator
            .events()
            .publish(SyncEvent::Deleted { id: *id });
        self.refresh_pending().await;
        Ok(())
    }

    /// Looks up a payment; tombstones are hidden
    pub async fn get(&self, id: &PaymentId) -> Result<Option<Payment>, LedgerError> {
        let payment = self.coordinator.local().fetch_by_id(id).await?;
        Ok(payment.filter(|p| !p.is_deleted()))
    }

    /// Lists payments by due date; tombstones are hidden
    pub async fn list(&self) -> Result<Vec<Payment>, LedgerError> {
        let mut payments: Vec<Payment> = self
            .coordinator
            .local()
            .fetch_all()
            .await?
            .into_iter()
            .filter(|p| !p.is_deleted())
            .collect();
        payments.sort_by(|a, b| {
            a.due_date()
                .cmp(&b.due_date())
                .then_with(|| a.name().cmp(b.name()))
        });
        Ok(payments)
    }

    async fn live(&self, id: &PaymentId) -> Result<Payment, LedgerError> {
        self.coordinator
            .local()
            .fetch_by_id(id)
            .await?
            .filter(|p| !p.is_deleted())
            .ok_or(LedgerError::NotFound(*id))
    }

    async fn refresh_pending(&self) {
        if let Err(e) = self.coordinator.update_pending_sync_count().await {
            warn!(error = %e, "Failed to refresh pending sync count");
        }
    }
}
