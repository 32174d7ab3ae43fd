//! Integration tests for SqlitePaymentStore
//!
//! These tests verify every ILocalStore method against an in-memory SQLite
//! database. Each test creates a fresh database to keep tests isolated.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use paysync_cache::{DatabasePool, SqlitePaymentStore};
use paysync_core::domain::{
    Category, CurrencyCode, EventRef, GroupId, Payment, PaymentDraft, PaymentEdit, PaymentId,
    SyncStatus,
};
use paysync_core::ports::ILocalStore;

// ============================================================================
// Test helpers
// ============================================================================

async fn setup() -> SqlitePaymentStore {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    SqlitePaymentStore::new(pool.pool().clone())
}

fn payment(name: &str, cents: i64, day: u32) -> Payment {
    Payment::new(PaymentDraft::new(
        name,
        Decimal::new(cents, 2),
        CurrencyCode::new("EUR").unwrap(),
        Utc.with_ymd_and_hms(2026, 11, day, 0, 0, 0).unwrap(),
        Category::Utilities,
    ))
    .unwrap()
}

fn synced(mut p: Payment) -> Payment {
    p.confirm_synced(Utc::now()).unwrap();
    p
}

fn modified(p: Payment) -> Payment {
    let mut p = synced(p);
    p.apply_edit(PaymentEdit {
        is_paid: Some(true),
        ..Default::default()
    })
    .unwrap();
    p
}

// ============================================================================
// Read/write tests
// ============================================================================

#[tokio::test]
async fn test_upsert_and_fetch_by_id() {
    let store = setup().await;
    let p = payment("Electricity", 8450, 3);

    store.upsert(&p).await.unwrap();

    let fetched = store.fetch_by_id(p.id()).await.unwrap().unwrap();
    assert_eq!(fetched, p);
    assert_eq!(fetched.amount().to_string(), "84.50");
    assert_eq!(fetched.sync_status(), SyncStatus::Local);
}

#[tokio::test]
async fn test_fetch_by_id_missing() {
    let store = setup().await;
    let result = store.fetch_by_id(&PaymentId::new()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_round_trip_keeps_optional_links_and_sync_fields() {
    let store = setup().await;
    let draft = PaymentDraft::new(
        "Insurance",
        Decimal::new(12_000_01, 2),
        CurrencyCode::new("chf").unwrap(),
        Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap(),
        Category::Insurance,
    )
    .with_group(GroupId::new())
    .with_event_ref(EventRef::from(uuid::Uuid::new_v4()));
    let p = synced(Payment::new(draft).unwrap());

    store.upsert(&p).await.unwrap();

    let fetched = store.fetch_by_id(p.id()).await.unwrap().unwrap();
    assert_eq!(fetched.group_id(), p.group_id());
    assert_eq!(fetched.event_ref(), p.event_ref());
    assert_eq!(fetched.currency().as_str(), "CHF");
    assert_eq!(fetched.sync_status(), SyncStatus::Synced);
    assert!(fetched.last_synced_at().is_some());
}

#[tokio::test]
async fn test_upsert_replaces_existing_row() {
    let store = setup().await;
    let mut p = payment("Internet", 3999, 10);
    store.upsert(&p).await.unwrap();

    p.apply_edit(PaymentEdit {
        name: Some("Fibre".to_string()),
        ..Default::default()
    })
    .unwrap();
    store.upsert(&p).await.unwrap();

    let all = store.fetch_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name(), "Fibre");
}

#[tokio::test]
async fn test_upsert_many_and_fetch_all_ordered_by_due_date() {
    let store = setup().await;
    let late = payment("Late", 100, 20);
    let early = payment("Early", 100, 2);
    let middle = payment("Middle", 100, 11);

    store
        .upsert_many(&[late.clone(), early.clone(), middle.clone()])
        .await
        .unwrap();

    let names: Vec<_> = store
        .fetch_all()
        .await
        .unwrap()
        .iter()
        .map(|p| p.name().to_string())
        .collect();
    assert_eq!(names, vec!["Early", "Middle", "Late"]);
}

#[tokio::test]
async fn test_upsert_many_empty_is_noop() {
    let store = setup().await;
    store.upsert_many(&[]).await.unwrap();
    assert!(store.fetch_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_by_status() {
    let store = setup().await;
    let local = payment("Local", 100, 1);
    let synced_p = synced(payment("Synced", 100, 2));
    let modified_p = modified(payment("Modified", 100, 3));
    let mut deleted = synced(payment("Deleted", 100, 4));
    deleted.mark_deleted().unwrap();

    store
        .upsert_many(&[local, synced_p, modified_p, deleted])
        .await
        .unwrap();

    for (status, name) in [
        (SyncStatus::Local, "Local"),
        (SyncStatus::Synced, "Synced"),
        (SyncStatus::Modified, "Modified"),
        (SyncStatus::Deleted, "Deleted"),
    ] {
        let found = store.fetch_by_status(status).await.unwrap();
        assert_eq!(found.len(), 1, "status {status}");
        assert_eq!(found[0].name(), name);
    }
}

// ============================================================================
// Delete tests
// ============================================================================

#[tokio::test]
async fn test_delete_by_id() {
    let store = setup().await;
    let keep = payment("Keep", 100, 1);
    let drop = payment("Drop", 100, 2);
    store
        .upsert_many(&[keep.clone(), drop.clone()])
        .await
        .unwrap();

    store.delete_by_id(drop.id()).await.unwrap();

    assert!(store.fetch_by_id(drop.id()).await.unwrap().is_none());
    assert!(store.fetch_by_id(keep.id()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_missing_id_is_not_an_error() {
    let store = setup().await;
    store.delete_by_id(&PaymentId::new()).await.unwrap();
    store.delete_many(&[PaymentId::new()]).await.unwrap();
}

#[tokio::test]
async fn test_delete_many() {
    let store = setup().await;
    let a = payment("A", 100, 1);
    let b = payment("B", 100, 2);
    let c = payment("C", 100, 3);
    store
        .upsert_many(&[a.clone(), b.clone(), c.clone()])
        .await
        .unwrap();

    store.delete_many(&[*a.id(), *c.id()]).await.unwrap();

    let remaining = store.fetch_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id(), b.id());
}

#[tokio::test]
async fn test_clear_all() {
    let store = setup().await;
    store
        .upsert_many(&[payment("A", 100, 1), payment("B", 100, 2)])
        .await
        .unwrap();

    store.clear_all().await.unwrap();

    assert!(store.fetch_all().await.unwrap().is_empty());
}

// ============================================================================
// Count tests
// ============================================================================

#[tokio::test]
async fn test_count_by_status() {
    let store = setup().await;
    store
        .upsert_many(&[
            payment("L1", 100, 1),
            payment("L2", 100, 2),
            synced(payment("S1", 100, 3)),
            modified(payment("M1", 100, 4)),
        ])
        .await
        .unwrap();

    let counts = store.count_by_status().await.unwrap();
    assert_eq!(counts.get(&SyncStatus::Local), Some(&2));
    assert_eq!(counts.get(&SyncStatus::Synced), Some(&1));
    assert_eq!(counts.get(&SyncStatus::Modified), Some(&1));
    assert_eq!(counts.get(&SyncStatus::Deleted), None);
}

// ============================================================================
// On-disk pool
// ============================================================================

#[tokio::test]
async fn test_file_database_persists_across_pools() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("paysync.db");
    let p = payment("Persisted", 5000, 5);

    {
        let pool = DatabasePool::new(&db_path).await.unwrap();
        let store = SqlitePaymentStore::new(pool.pool().clone());
        store.upsert(&p).await.unwrap();
        pool.close().await;
    }

    let pool = DatabasePool::new(&db_path).await.unwrap();
    let store = SqlitePaymentStore::new(pool.pool().clone());
    let fetched = store.fetch_by_id(p.id()).await.unwrap();
    assert_eq!(fetched, Some(p));
}
