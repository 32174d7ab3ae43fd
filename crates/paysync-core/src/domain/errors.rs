//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures, invalid sync-status transitions and
//! malformed identifiers or values.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid sync status transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current status
        from: String,
        /// The attempted target status
        to: String,
    },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Currency code is not a three-letter ISO-4217 code
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Amount could not be parsed or is out of range
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Unknown sync status name
    #[error("Unknown sync status: {0}")]
    UnknownStatus(String),
}
