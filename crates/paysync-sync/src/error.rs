//! Sync error taxonomy
//!
//! [`SyncError`] is the classification observers see for a failed pass.
//! Adapter errors are mapped into it at the coordinator boundary:
//!
//! | Source                                 | SyncError                  |
//! |----------------------------------------|----------------------------|
//! | `AuthError::NotAuthenticated`          | `NotAuthenticated`         |
//! | `AuthError::SessionExpired`            | `SessionExpired`           |
//! | `AuthError::Network`                   | `NetworkError`             |
//! | `RemoteError` 401 / no token           | `SessionExpired`           |
//! | `RemoteError::Network`, any phase      | `NetworkError`             |
//! | other `RemoteError` while uploading    | `UploadFailed`             |
//! | other `RemoteError` while downloading  | `DownloadFailed`           |
//! | local store failure, anything else     | `Unknown`                  |
//!
//! A 403 is a permission failure, not a stale login, so it lands in the
//! phase-specific row. Transport failures get `NetworkError` even during
//! upload or download, where the pass flow alone would suggest
//! `UploadFailed`/`DownloadFailed`: observers need to tell a transient
//! outage from a rejected request.

use serde::Serialize;
use thiserror::Error;

use paysync_core::domain::{DomainError, PaymentId};
use paysync_core::ports::{AuthError, RemoteError};

use crate::coordinator::SyncPhase;

/// Classified failure of a sync pass
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SyncError {
    /// Nobody is signed in
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The session is present but no longer accepted
    #[error("Session expired")]
    SessionExpired,

    /// The remote backend could not be reached
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The remote store rejected the upload batch
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Remote records could not be fetched
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Local and remote edits of the same record need a field-level merge
    ///
    /// Never produced: conflicting edits are settled in favour of the local
    /// copy. Kept so that exhaustive matches stay stable.
    #[error("Conflicting local and remote changes")]
    ConflictError,

    /// Anything else, with the underlying message
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SyncError {
    /// Returns true if retrying later may succeed without user action
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::NetworkError(_))
    }

    /// Returns true if the user has to sign in again
    pub fn requires_login(&self) -> bool {
        matches!(self, SyncError::NotAuthenticated | SyncError::SessionExpired)
    }

    /// Maps a remote adapter failure raised during `phase`
    pub fn from_remote(phase: SyncPhase, err: RemoteError) -> Self {
        if err.is_auth() {
            return SyncError::SessionExpired;
        }
        if let RemoteError::Network(detail) = err {
            return SyncError::NetworkError(detail);
        }
        match phase {
            SyncPhase::Upload => SyncError::UploadFailed(err.to_string()),
            SyncPhase::Download => SyncError::DownloadFailed(err.to_string()),
            SyncPhase::Authenticate | SyncPhase::Deletion => SyncError::Unknown(err.to_string()),
        }
    }

    /// Maps a local store failure
    pub fn from_local(err: anyhow::Error) -> Self {
        SyncError::Unknown(format!("local store: {err:#}"))
    }
}

impl From<AuthError> for SyncError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotAuthenticated => SyncError::NotAuthenticated,
            AuthError::SessionExpired => SyncError::SessionExpired,
            AuthError::Network(detail) => SyncError::NetworkError(detail),
            other => SyncError::Unknown(other.to_string()),
        }
    }
}

impl From<DomainError> for SyncError {
    fn from(err: DomainError) -> Self {
        SyncError::Unknown(err.to_string())
    }
}

/// Errors returned by local payment edits
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No live payment has this identifier
    #[error("Payment not found: {0}")]
    NotFound(PaymentId),

    /// The edit violates a domain rule
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The local store failed
    #[error("Local store error: {0:#}")]
    Store(#[from] anyhow::Error),
}
