//! Authentication port (driven/secondary port)
//!
//! The sync core never acquires or refreshes credentials. It only asks an
//! auth collaborator who the current user is and for a bearer token to
//! attach to remote calls.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::UserId;

// ============================================================================
// Session struct
// ============================================================================

/// An authenticated backend session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Owner of every remote row read or written with this session
    pub user_id: UserId,
    /// Bearer token for remote calls
    pub access_token: String,
    /// When the token stops being accepted (`None` = no known expiry)
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a session without a known expiry
    pub fn new(user_id: UserId, access_token: impl Into<String>) -> Self {
        Self {
            user_id,
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Sets the expiry to `lifetime` from now
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidSession` if the expiry is not a
    /// representable timestamp.
    pub fn expiring_in(mut self, lifetime: Duration) -> Result<Self, AuthError> {
        let at = Utc::now().checked_add_signed(lifetime).ok_or_else(|| {
            AuthError::InvalidSession(format!("lifetime of {lifetime} is out of range"))
        })?;
        self.expires_at = Some(at);
        Ok(self)
    }

    /// Returns true if the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }
}

// ============================================================================
// AuthError
// ============================================================================

/// Errors surfaced by an auth collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No session is stored
    #[error("Not authenticated")]
    NotAuthenticated,

    /// A session exists but is no longer valid
    #[error("Session expired")]
    SessionExpired,

    /// The identity backend could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// The session data cannot be used
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    /// The credential store failed
    #[error("Credential storage error: {0}")]
    Storage(String),
}

// ============================================================================
// IAuthProvider trait
// ============================================================================

/// Port trait for the current-user/session collaborator
#[async_trait::async_trait]
pub trait IAuthProvider: Send + Sync {
    /// Returns the identifier of the signed-in user
    ///
    /// Fails with `NotAuthenticated` when nobody is signed in and with
    /// `SessionExpired` when the stored session is stale.
    async fn current_user_id(&self) -> Result<UserId, AuthError>;

    /// Returns a bearer token valid for remote calls
    async fn access_token(&self) -> Result<String, AuthError>;
}
