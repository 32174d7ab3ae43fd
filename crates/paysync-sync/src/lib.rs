//! PaySync Sync - Offline-first payment synchronization
//!
//! Provides:
//! - One-pass bidirectional sync between the local and remote payment stores
//! - Per-record status tracking with local-wins conflict handling
//! - Observable sync state (pending count, last error)
//! - The only write path for presentation code (`PaymentLedger`)
//! - Timer-driven retries
//!
//! ## Modules
//!
//! - [`coordinator`] - `SyncCoordinator`, running upload, deletion and download phases
//! - [`error`] - The `SyncError` taxonomy and its mapping from adapter errors
//! - [`events`] - Event sink adapters (tracing, broadcast channel)
//! - [`ledger`] - `PaymentLedger`, local create/edit/delete
//! - [`scheduler`] - `SyncScheduler`, periodic and on-demand passes
//! - [`state`] - `SyncState` snapshot published to observers

pub mod coordinator;
pub mod error;
pub mod events;
pub mod ledger;
pub mod scheduler;
pub mod state;

pub use coordinator::{DeletionFailure, SyncCoordinator, SyncPhase, SyncReport};
pub use error::{LedgerError, SyncError};
pub use events::{BroadcastEventSink, TracingEventSink};
pub use ledger::PaymentLedger;
pub use scheduler::SyncScheduler;
pub use state::SyncState;
