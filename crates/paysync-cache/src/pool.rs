//! SQLite pool for the payment store
//!
//! A [`DatabasePool`] is always migrated: whichever constructor is used,
//! the `payments` table exists before the pool is handed out.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

/// Schema of the payment table, applied idempotently on every open
const SCHEMA: &str = include_str!("migrations/20261018_payments.sql");

/// Connections kept for an on-disk database
const FILE_CONNECTIONS: u32 = 5;

/// How long a writer waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Migrated SQLite pool backing [`SqlitePaymentStore`](crate::SqlitePaymentStore)
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens the payment database at `db_path`
    ///
    /// Missing parent directories and the file itself are created. The
    /// database runs in WAL mode so that CLI reads do not block a sync pass.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(dir) = db_path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                CacheError::ConnectionFailed(format!("cannot create {}: {e}", dir.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool_options = SqlitePoolOptions::new().max_connections(FILE_CONNECTIONS);
        let pool = Self::open(pool_options, options).await?;

        tracing::info!(path = %db_path.display(), "Payment store opened");
        Ok(pool)
    }

    /// Opens a private in-memory database
    ///
    /// Limited to one connection that is never recycled: every SQLite
    /// in-memory connection sees its own database, which dies with it.
    pub async fn in_memory() -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CacheError::ConnectionFailed(e.to_string()))?;
        let pool_options = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        Self::open(pool_options, options).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Waits for open connections to finish and closes them
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn open(
        pool_options: SqlitePoolOptions,
        options: SqliteConnectOptions,
    ) -> Result<Self, CacheError> {
        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| CacheError::ConnectionFailed(e.to_string()))?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| CacheError::MigrationFailed(format!("payments schema: {e}")))?;
        tracing::debug!("Payment schema ready");

        Ok(Self { pool })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_count(pool: &DatabasePool) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'payments'",
        )
        .fetch_one(pool.pool())
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_pool_is_migrated() {
        let pool = DatabasePool::in_memory().await.unwrap();
        assert_eq!(table_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_file_pool_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("paysync.db");

        let pool = DatabasePool::new(&path).await.unwrap();

        assert!(path.exists());
        assert_eq!(table_count(&pool).await, 1);
        pool.close().await;

        // Reopening runs the schema again without failing
        let reopened = DatabasePool::new(&path).await.unwrap();
        assert_eq!(table_count(&reopened).await, 1);
    }
}
