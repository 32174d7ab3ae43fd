//! Domain entities and business logic
//!
//! This module contains the core domain types for PaySync:
//! - Newtypes for type-safe identifiers and validated values
//! - The synchronized `Payment` entity and its `SyncStatus` state machine
//! - Domain-specific error types

pub mod errors;
pub mod newtypes;
pub mod payment;

// Re-export commonly used types
pub use errors::DomainError;
pub use newtypes::*;
pub use payment::{Category, Payment, PaymentDraft, PaymentEdit, PaymentRecord, SyncStatus};
