//! Local store port (driven/secondary port)
//!
//! This module defines the interface for the always-available, on-device
//! record store. The store is a plain keyed entity store: it persists
//! whatever `Payment` it is handed and never decides sync statuses itself.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, serialization) and always surface as `unknown` in a sync pass.
//! - Bulk writes are atomic: either every record is written or none is.
//! - Missing identifiers are not an error for deletes.

use std::collections::HashMap;

use crate::domain::{Payment, PaymentId, SyncStatus};

/// Port trait for the local payment store
#[async_trait::async_trait]
pub trait ILocalStore: Send + Sync {
    /// Returns every stored payment, tombstones included
    async fn fetch_all(&self) -> anyhow::Result<Vec<Payment>>;

    /// Returns every payment with the given sync status
    async fn fetch_by_status(&self, status: SyncStatus) -> anyhow::Result<Vec<Payment>>;

    /// Looks up a single payment
    ///
    /// # Returns
    /// `None` if no record with this identifier exists
    async fn fetch_by_id(&self, id: &PaymentId) -> anyhow::Result<Option<Payment>>;

    /// Inserts or replaces a payment, keyed by its identifier
    async fn upsert(&self, payment: &Payment) -> anyhow::Result<()>;

    /// Inserts or replaces several payments in one transaction
    async fn upsert_many(&self, payments: &[Payment]) -> anyhow::Result<()>;

    /// Removes a payment
    async fn delete_by_id(&self, id: &PaymentId) -> anyhow::Result<()>;

    /// Removes several payments in one transaction
    async fn delete_many(&self, ids: &[PaymentId]) -> anyhow::Result<()>;

    /// Removes every stored payment
    async fn clear_all(&self) -> anyhow::Result<()>;

    /// Counts stored payments grouped by sync status
    ///
    /// Statuses with no records are absent from the map.
    async fn count_by_status(&self) -> anyhow::Result<HashMap<SyncStatus, u64>>;
}
