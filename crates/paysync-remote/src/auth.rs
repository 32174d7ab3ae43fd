//! Session storage and the current-user provider
//!
//! Acquiring and refreshing tokens happens elsewhere; this module only keeps
//! the resulting [`Session`] and answers "who is signed in".
//!
//! ## Components
//!
//! - [`SessionStorage`] - Where the session lives
//! - [`KeyringSessionStorage`] - System keyring implementation
//! - [`SessionAuthProvider`] - `IAuthProvider` backed by a `SessionStorage`

use std::sync::Arc;

use anyhow::{Context, Result};
use paysync_core::domain::UserId;
use paysync_core::ports::{AuthError, IAuthProvider, Session};
use tracing::{debug, info};

/// Keyring service name for storing the session
const KEYRING_SERVICE: &str = "paysync";

/// Keyring username under which the single active session is stored
const KEYRING_USER: &str = "session";

// ============================================================================
// SessionStorage
// ============================================================================

/// Persistent home of the active session
pub trait SessionStorage: Send + Sync {
    /// Stores (replacing) the active session
    fn store(&self, session: &Session) -> Result<()>;

    /// Loads the active session, if any
    fn load(&self) -> Result<Option<Session>>;

    /// Removes the active session; succeeds if none is stored
    fn clear(&self) -> Result<()>;
}

// ============================================================================
// KeyringSessionStorage
// ============================================================================

/// Stores the session in the system keyring
///
/// Uses the `keyring` crate to keep the session in the OS credential store
/// (GNOME Keyring, KDE Wallet, macOS Keychain). The session is serialized
/// as JSON under the service name "paysync".
#[derive(Debug, Clone)]
pub struct KeyringSessionStorage {
    service: String,
}

impl KeyringSessionStorage {
    /// Creates storage under the default service name
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, KEYRING_USER).context("Failed to create keyring entry")
    }
}

impl Default for KeyringSessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStorage for KeyringSessionStorage {
    fn store(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session).context("Failed to serialize session")?;

        self.entry()?
            .set_password(&json)
            .context("Failed to store session in keyring")?;

        debug!(user_id = %session.user_id, "Stored session in keyring");
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>> {
        match self.entry()?.get_password() {
            Ok(json) => {
                let session: Session = serde_json::from_str(&json)
                    .context("Failed to deserialize session from keyring")?;
                debug!(user_id = %session.user_id, "Loaded session from keyring");
                Ok(Some(session))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No session found in keyring");
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                info!("Cleared session from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No session to clear");
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}

// ============================================================================
// SessionAuthProvider
// ============================================================================

/// `IAuthProvider` that reads the stored session on every call
pub struct SessionAuthProvider {
    storage: Arc<dyn SessionStorage>,
}

impl SessionAuthProvider {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// Returns the stored session, whether or not it is still valid
    pub fn session(&self) -> Result<Option<Session>> {
        self.storage.load()
    }

    /// Stores a new session, replacing any previous one
    pub fn sign_in(&self, session: &Session) -> Result<()> {
        self.storage.store(session)?;
        info!(user_id = %session.user_id, "Signed in");
        Ok(())
    }

    /// Forgets the stored session
    pub fn sign_out(&self) -> Result<()> {
        self.storage.clear()
    }

    fn valid_session(&self) -> Result<Session, AuthError> {
        let session = self
            .storage
            .load()
            .map_err(|e| AuthError::Storage(format!("{e:#}")))?
            .ok_or(AuthError::NotAuthenticated)?;

        if session.is_expired() {
            debug!(user_id = %session.user_id, "Stored session has expired");
            return Err(AuthError::SessionExpired);
        }
        Ok(session)
    }
}

#[async_trait::async_trait]
impl IAuthProvider for SessionAuthProvider {
    async fn current_user_id(&self) -> Result<UserId, AuthError> {
        self.valid_session().map(|s| s.user_id)
    }

    async fn access_token(&self) -> Result<String, AuthError> {
        self.valid_session().map(|s| s.access_token)
    }
}
