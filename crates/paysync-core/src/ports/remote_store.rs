//! Remote store port (driven/secondary port)
//!
//! This module defines the interface for the authenticated remote backend
//! table holding each user's payments, and the DTO exchanged with it.
//!
//! ## Design Notes
//!
//! - Unlike the local store, errors are typed (`RemoteError`): the sync
//!   coordinator must tell transport failures apart from authorization
//!   failures to classify a failed pass.
//! - `RemotePaymentDto` carries no sync bookkeeping. Whatever the remote
//!   table holds is by definition in sync with itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    Category, CurrencyCode, DomainError, EventRef, GroupId, Payment, PaymentId, PaymentRecord,
    SyncStatus, UserId,
};

// ============================================================================
// RemotePaymentDto
// ============================================================================

/// A payment row as stored in the remote table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePaymentDto {
    pub id: PaymentId,
    pub user_id: UserId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub due_date: DateTime<Utc>,
    pub is_paid: bool,
    pub category: Category,
    #[serde(default)]
    pub event_ref: Option<EventRef>,
    #[serde(default)]
    pub group_id: Option<GroupId>,
}

impl RemotePaymentDto {
    /// Builds the remote row for a local payment owned by `user_id`
    pub fn from_payment(user_id: UserId, payment: &Payment) -> Self {
        Self {
            id: *payment.id(),
            user_id,
            name: payment.name().to_string(),
            amount: payment.amount(),
            currency: payment.currency().clone(),
            due_date: payment.due_date(),
            is_paid: payment.is_paid(),
            category: payment.category(),
            event_ref: payment.event_ref().copied(),
            group_id: payment.group_id().copied(),
        }
    }

    /// Converts the row into a local payment confirmed as synced at `synced_at`
    ///
    /// # Errors
    /// Returns a `DomainError` if the row violates a domain invariant
    /// (blank name, negative amount).
    pub fn into_synced_payment(self, synced_at: DateTime<Utc>) -> Result<Payment, DomainError> {
        Payment::try_from(PaymentRecord {
            id: self.id,
            name: self.name,
            amount: self.amount,
            currency: self.currency,
            due_date: self.due_date,
            is_paid: self.is_paid,
            category: self.category,
            event_ref: self.event_ref,
            group_id: self.group_id,
            sync_status: SyncStatus::Synced,
            last_synced_at: Some(synced_at),
        })
    }
}

// ============================================================================
// RemoteError
// ============================================================================

/// Errors surfaced by a remote store adapter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// No response was received (connection refused, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend rejected the credentials (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The credentials are valid but lack permission (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The write clashed with existing remote data (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backend failed internally (HTTP 5xx)
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status
    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No access token could be obtained for the request
    #[error("Authentication required: {0}")]
    Auth(String),
}

impl RemoteError {
    /// Returns true for failures that call for a new login
    ///
    /// A 403 is not one of them: the credentials were accepted but the
    /// request is not permitted.
    pub fn is_auth(&self) -> bool {
        matches!(self, RemoteError::Unauthorized(_) | RemoteError::Auth(_))
    }
}

// ============================================================================
// IRemoteStore trait
// ============================================================================

/// Port trait for the remote payment table
///
/// All calls run over an authenticated transport; implementations obtain
/// credentials themselves.
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Fetches every row owned by `user_id`
    async fn fetch_all_for_user(&self, user_id: &UserId)
        -> Result<Vec<RemotePaymentDto>, RemoteError>;

    /// Inserts or replaces rows in a single atomic batch
    async fn upsert_many(
        &self,
        user_id: &UserId,
        rows: &[RemotePaymentDto],
    ) -> Result<(), RemoteError>;

    /// Deletes a single row; deleting a missing row succeeds
    async fn delete_by_id(&self, id: &PaymentId) -> Result<(), RemoteError>;

    /// Deletes several rows in one request
    async fn delete_many(&self, ids: &[PaymentId]) -> Result<(), RemoteError>;
}
