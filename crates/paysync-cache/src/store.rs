//! SQLite implementation of ILocalStore
//!
//! ## Type Mapping
//!
//! | Domain Type              | SQL Type | Strategy                                   |
//! |--------------------------|----------|--------------------------------------------|
//! | PaymentId, EventRef, GroupId | TEXT | UUID string via `Display` / `FromStr`      |
//! | Decimal                  | TEXT     | Exact decimal string, never REAL           |
//! | CurrencyCode             | TEXT     | `as_str()` / `CurrencyCode::new()`         |
//! | DateTime<Utc>            | TEXT     | RFC 3339 via `to_rfc3339()`                |
//! | Category, SyncStatus     | TEXT     | Wire name via `as_str()` / `FromStr`       |
//! | bool                     | INTEGER  | 0 / 1                                      |

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use paysync_core::domain::{
    Category, CurrencyCode, EventRef, GroupId, Payment, PaymentId, PaymentRecord, SyncStatus,
};
use paysync_core::ports::ILocalStore;

use crate::CacheError;

const UPSERT_SQL: &str = "INSERT INTO payments \
     (id, name, amount, currency, due_date, is_paid, category, \
      event_ref, group_id, sync_status, last_synced_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
     ON CONFLICT(id) DO UPDATE SET \
      name = excluded.name, amount = excluded.amount, currency = excluded.currency, \
      due_date = excluded.due_date, is_paid = excluded.is_paid, \
      category = excluded.category, event_ref = excluded.event_ref, \
      group_id = excluded.group_id, sync_status = excluded.sync_status, \
      last_synced_at = excluded.last_synced_at, updated_at = excluded.updated_at";

/// SQLite-based implementation of the local store port
pub struct SqlitePaymentStore {
    pool: SqlitePool,
}

impl SqlitePaymentStore {
    /// Creates a new store with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

/// Parse a DateTime<Utc> from an RFC 3339 string
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CacheError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            CacheError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

fn parse_optional_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, CacheError> {
    match s {
        Some(ref val) if !val.is_empty() => parse_datetime(val).map(Some),
        _ => Ok(None),
    }
}

fn parse_optional<T: FromStr>(s: Option<String>, what: &str) -> Result<Option<T>, CacheError>
where
    T::Err: std::fmt::Display,
{
    s.map(|val| {
        val.parse::<T>().map_err(|e| {
            CacheError::SerializationError(format!("Invalid {} '{}': {}", what, val, e))
        })
    })
    .transpose()
}

// ============================================================================
// Row mapping
// ============================================================================

/// Reconstruct a Payment from a database row
///
/// Goes through `PaymentRecord` so stored rows are re-validated against the
/// domain invariants on the way out.
fn payment_from_row(row: &SqliteRow) -> Result<Payment, CacheError> {
    let id_str: String = row.try_get("id")?;
    let name: String = row.try_get("name")?;
    let amount_str: String = row.try_get("amount")?;
    let currency_str: String = row.try_get("currency")?;
    let due_date_str: String = row.try_get("due_date")?;
    let is_paid: bool = row.try_get("is_paid")?;
    let category_str: String = row.try_get("category")?;
    let event_ref_str: Option<String> = row.try_get("event_ref")?;
    let group_id_str: Option<String> = row.try_get("group_id")?;
    let sync_status_str: String = row.try_get("sync_status")?;
    let last_synced_at_str: Option<String> = row.try_get("last_synced_at")?;

    let amount = Decimal::from_str(&amount_str).map_err(|e| {
        CacheError::SerializationError(format!("Invalid amount '{}': {}", amount_str, e))
    })?;

    let record = PaymentRecord {
        id: PaymentId::from_str(&id_str)?,
        name,
        amount,
        currency: CurrencyCode::new(currency_str)?,
        due_date: parse_datetime(&due_date_str)?,
        is_paid,
        category: Category::from_name_lossy(&category_str),
        event_ref: parse_optional::<EventRef>(event_ref_str, "event_ref")?,
        group_id: parse_optional::<GroupId>(group_id_str, "group_id")?,
        sync_status: SyncStatus::from_str(&sync_status_str)?,
        last_synced_at: parse_optional_datetime(last_synced_at_str)?,
    };

    Ok(Payment::try_from(record)?)
}

fn payments_from_rows(rows: &[SqliteRow]) -> Result<Vec<Payment>, CacheError> {
    rows.iter().map(payment_from_row).collect()
}

// ============================================================================
// ILocalStore implementation
// ============================================================================

#[async_trait::async_trait]
impl ILocalStore for SqlitePaymentStore {
    async fn fetch_all(&self) -> anyhow::Result<Vec<Payment>> {
        let rows = sqlx::query("SELECT * FROM payments ORDER BY due_date ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(payments_from_rows(&rows)?)
    }

    async fn fetch_by_status(&self, status: SyncStatus) -> anyhow::Result<Vec<Payment>> {
        let rows = sqlx::query(
            "SELECT * FROM payments WHERE sync_status = ? ORDER BY due_date ASC, id ASC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(payments_from_rows(&rows)?)
    }

    async fn fetch_by_id(&self, id: &PaymentId) -> anyhow::Result<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(payment_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, payment: &Payment) -> anyhow::Result<()> {
        self.upsert_many(std::slice::from_ref(payment)).await
    }

    async fn upsert_many(&self, payments: &[Payment]) -> anyhow::Result<()> {
        if payments.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for payment in payments {
            sqlx::query(UPSERT_SQL)
                .bind(payment.id().to_string())
                .bind(payment.name())
                .bind(payment.amount().to_string())
                .bind(payment.currency().as_str())
                .bind(payment.due_date().to_rfc3339())
                .bind(payment.is_paid())
                .bind(payment.category().as_str())
                .bind(payment.event_ref().map(|r| r.to_string()))
                .bind(payment.group_id().map(|g| g.to_string()))
                .bind(payment.sync_status().as_str())
                .bind(payment.last_synced_at().map(|dt| dt.to_rfc3339()))
                .bind(&now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::trace!(count = payments.len(), "Upserted payments");
        Ok(())
    }

    async fn delete_by_id(&self, id: &PaymentId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM payments WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        tracing::trace!(payment_id = %id, "Deleted payment");
        Ok(())
    }

    async fn delete_many(&self, ids: &[PaymentId]) -> anyhow::Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query("DELETE FROM payments WHERE id = ?")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::trace!(count = ids.len(), "Deleted payments");
        Ok(())
    }

    async fn clear_all(&self) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM payments")
            .execute(&self.pool)
            .await?;

        tracing::debug!(removed = result.rows_affected(), "Cleared payment store");
        Ok(())
    }

    async fn count_by_status(&self) -> anyhow::Result<HashMap<SyncStatus, u64>> {
        let rows = sqlx::query(
            "SELECT sync_status, COUNT(*) AS count FROM payments GROUP BY sync_status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = HashMap::new();
        for row in &rows {
            let status_str: String = row.try_get("sync_status")?;
            let count: i64 = row.try_get("count")?;
            counts.insert(SyncStatus::from_str(&status_str)?, count as u64);
        }

        Ok(counts)
    }
}
