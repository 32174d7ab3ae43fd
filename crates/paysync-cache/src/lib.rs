//! PaySync Cache - Local payment persistence
//!
//! SQLite-backed implementation of the `ILocalStore` port from
//! `paysync-core`. It is a driven (secondary) adapter in the hexagonal
//! architecture: it stores whatever payments it is given and never changes
//! a sync status on its own.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqlitePaymentStore`] - Full `ILocalStore` implementation
//! - [`CacheError`] - Error types for cache operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use paysync_cache::{DatabasePool, SqlitePaymentStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/paysync/paysync.db")).await?;
//! let store = SqlitePaymentStore::new(pool.pool().clone());
//! // Use store as ILocalStore...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod store;

pub use pool::DatabasePool;
pub use store::SqlitePaymentStore;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be turned back into a domain value
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}

impl From<paysync_core::domain::DomainError> for CacheError {
    fn from(e: paysync_core::domain::DomainError) -> Self {
        CacheError::SerializationError(e.to_string())
    }
}
