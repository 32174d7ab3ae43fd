//! Sync event sink port
//!
//! The coordinator and the payment ledger report what they did through an
//! injectable sink. Nothing in the sync path depends on a sink being
//! present or on what it does with an event.

use serde::Serialize;

use crate::domain::PaymentId;

/// Something observable that happened to the payment set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A payment was created locally
    Created { id: PaymentId },
    /// A payment was edited locally
    Updated { id: PaymentId },
    /// A payment was deleted locally (removed or tombstoned)
    Deleted { id: PaymentId },
    /// The remote store accepted an upload batch
    Uploaded { ids: Vec<PaymentId> },
    /// A tombstone was confirmed remotely and removed locally
    RemoteDeleted { id: PaymentId },
    /// The download phase merged remote rows into the local store
    Downloaded { inserted: usize, updated: usize },
    /// A pass finished (successfully, partially or cancelled)
    PassCompleted {
        uploaded: usize,
        remote_deleted: usize,
        deletion_failures: usize,
        downloaded: usize,
        cancelled: bool,
    },
}

/// Port trait for receiving sync events
pub trait IEventSink: Send + Sync {
    /// Delivers an event; must not block
    fn publish(&self, event: SyncEvent);
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl IEventSink for NoopEventSink {
    fn publish(&self, _event: SyncEvent) {}
}
