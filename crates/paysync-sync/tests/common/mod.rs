//! Shared fixtures for the sync integration tests
//!
//! The local store is the real SQLite adapter over an in-memory database.
//! The remote store, auth provider and event sink are in-memory fakes with
//! failure injection.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use paysync_cache::{DatabasePool, SqlitePaymentStore};
use paysync_core::domain::{
    Category, CurrencyCode, Payment, PaymentDraft, PaymentEdit, PaymentId, SyncStatus, UserId,
};
use paysync_core::ports::{
    AuthError, IAuthProvider, IEventSink, ILocalStore, IRemoteStore, RemoteError,
    RemotePaymentDto, SyncEvent,
};
use paysync_sync::{PaymentLedger, SyncCoordinator};

// ============================================================================
// Identities and payments
// ============================================================================

pub fn user() -> UserId {
    "6f1c2a9e-3b4d-4e5f-8a9b-0c1d2e3f4a5b".parse().unwrap()
}

pub fn draft(name: &str, cents: i64) -> PaymentDraft {
    PaymentDraft::new(
        name,
        Decimal::new(cents, 2),
        CurrencyCode::new("EUR").unwrap(),
        Utc.with_ymd_and_hms(2026, 11, 5, 9, 0, 0).unwrap(),
        Category::Utilities,
    )
}

pub fn local_payment(name: &str, cents: i64) -> Payment {
    Payment::new(draft(name, cents)).unwrap()
}

/// A payment confirmed by an earlier pass
pub fn synced_payment(name: &str, cents: i64) -> Payment {
    let mut payment = local_payment(name, cents);
    payment
        .confirm_synced(Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap())
        .unwrap();
    payment
}

/// A previously synced payment renamed offline
pub fn modified_payment(name: &str, cents: i64, new_name: &str) -> Payment {
    let mut payment = synced_payment(name, cents);
    payment
        .apply_edit(PaymentEdit {
            name: Some(new_name.to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(payment.sync_status(), SyncStatus::Modified);
    payment
}

/// The remote row of `payment` with a different name
pub fn renamed_row(payment: &Payment, name: &str) -> RemotePaymentDto {
    let mut row = RemotePaymentDto::from_payment(user(), payment);
    row.name = name.to_string();
    row
}

// ============================================================================
// FakeRemote
// ============================================================================

/// A call made to the remote store
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Fetch,
    Upsert(usize),
    Delete(PaymentId),
}

#[derive(Default)]
struct RemoteInner {
    rows: HashMap<PaymentId, RemotePaymentDto>,
    calls: Vec<RemoteCall>,
    fail_upsert: Option<RemoteError>,
    fail_fetch: Option<RemoteError>,
    fail_delete: HashMap<PaymentId, RemoteError>,
    pause_fetch: bool,
    cancel_on_upsert: Option<CancellationToken>,
}

/// In-memory remote table
#[derive(Default)]
pub struct FakeRemote {
    inner: Mutex<RemoteInner>,
    /// Signalled when a paused fetch has started
    pub fetch_entered: Notify,
    /// Lets a paused fetch continue
    pub fetch_release: Notify,
}

impl FakeRemote {
    pub fn put(&self, row: RemotePaymentDto) {
        self.inner.lock().unwrap().rows.insert(row.id, row);
    }

    pub fn row(&self, id: &PaymentId) -> Option<RemotePaymentDto> {
        self.inner.lock().unwrap().rows.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == RemoteCall::Fetch)
            .count()
    }

    pub fn upsert_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RemoteCall::Upsert(_)))
            .count()
    }

    pub fn fail_upsert(&self, err: RemoteError) {
        self.inner.lock().unwrap().fail_upsert = Some(err);
    }

    pub fn fail_fetch(&self, err: RemoteError) {
        self.inner.lock().unwrap().fail_fetch = Some(err);
    }

    pub fn fail_delete(&self, id: PaymentId, err: RemoteError) {
        self.inner.lock().unwrap().fail_delete.insert(id, err);
    }

    /// Clears every injected failure
    pub fn heal(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_upsert = None;
        inner.fail_fetch = None;
        inner.fail_delete.clear();
    }

    /// Makes the next fetches wait for `fetch_release`
    pub fn pause_fetch(&self) {
        self.inner.lock().unwrap().pause_fetch = true;
    }

    /// Lets later fetches run without waiting
    pub fn resume_fetch(&self) {
        self.inner.lock().unwrap().pause_fetch = false;
    }

    /// Cancels `token` as soon as an upload batch is accepted
    pub fn cancel_on_upsert(&self, token: CancellationToken) {
        self.inner.lock().unwrap().cancel_on_upsert = Some(token);
    }
}

#[async_trait::async_trait]
impl IRemoteStore for FakeRemote {
    async fn fetch_all_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<RemotePaymentDto>, RemoteError> {
        let paused = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(RemoteCall::Fetch);
            inner.pause_fetch
        };
        if paused {
            self.fetch_entered.notify_one();
            self.fetch_release.notified().await;
        }

        let inner = self.inner.lock().unwrap();
        if let Some(err) = &inner.fail_fetch {
            return Err(err.clone());
        }
        let mut rows: Vec<_> = inner
            .rows
            .values()
            .filter(|row| row.user_id == *user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    async fn upsert_many(
        &self,
        user_id: &UserId,
        rows: &[RemotePaymentDto],
    ) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RemoteCall::Upsert(rows.len()));
        if let Some(err) = &inner.fail_upsert {
            return Err(err.clone());
        }
        for row in rows {
            let mut row = row.clone();
            row.user_id = *user_id;
            inner.rows.insert(row.id, row);
        }
        if let Some(token) = &inner.cancel_on_upsert {
            token.cancel();
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &PaymentId) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RemoteCall::Delete(*id));
        if let Some(err) = inner.fail_delete.get(id) {
            return Err(err.clone());
        }
        inner.rows.remove(id);
        Ok(())
    }

    async fn delete_many(&self, ids: &[PaymentId]) -> Result<(), RemoteError> {
        for id in ids {
            self.delete_by_id(id).await?;
        }
        Ok(())
    }
}

// ============================================================================
// FakeAuth
// ============================================================================

pub struct FakeAuth {
    user: Mutex<Result<UserId, AuthError>>,
}

impl FakeAuth {
    pub fn signed_in(user_id: UserId) -> Self {
        Self {
            user: Mutex::new(Ok(user_id)),
        }
    }

    pub fn set(&self, user: Result<UserId, AuthError>) {
        *self.user.lock().unwrap() = user;
    }
}

#[async_trait::async_trait]
impl IAuthProvider for FakeAuth {
    async fn current_user_id(&self) -> Result<UserId, AuthError> {
        self.user.lock().unwrap().clone()
    }

    async fn access_token(&self) -> Result<String, AuthError> {
        self.user.lock().unwrap().clone().map(|_| "token".to_string())
    }
}

// ============================================================================
// RecordingSink
// ============================================================================

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl IEventSink for RecordingSink {
    fn publish(&self, event: SyncEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ============================================================================
// FailingLocalStore
// ============================================================================

/// Local store whose disk is gone
pub struct FailingLocalStore;

#[async_trait::async_trait]
impl ILocalStore for FailingLocalStore {
    async fn fetch_all(&self) -> anyhow::Result<Vec<Payment>> {
        anyhow::bail!("disk I/O error")
    }

    async fn fetch_by_status(&self, _status: SyncStatus) -> anyhow::Result<Vec<Payment>> {
        anyhow::bail!("disk I/O error")
    }

    async fn fetch_by_id(&self, _id: &PaymentId) -> anyhow::Result<Option<Payment>> {
        anyhow::bail!("disk I/O error")
    }

    async fn upsert(&self, _payment: &Payment) -> anyhow::Result<()> {
        anyhow::bail!("disk I/O error")
    }

    async fn upsert_many(&self, _payments: &[Payment]) -> anyhow::Result<()> {
        anyhow::bail!("disk I/O error")
    }

    async fn delete_by_id(&self, _id: &PaymentId) -> anyhow::Result<()> {
        anyhow::bail!("disk I/O error")
    }

    async fn delete_many(&self, _ids: &[PaymentId]) -> anyhow::Result<()> {
        anyhow::bail!("disk I/O error")
    }

    async fn clear_all(&self) -> anyhow::Result<()> {
        anyhow::bail!("disk I/O error")
    }

    async fn count_by_status(&self) -> anyhow::Result<HashMap<SyncStatus, u64>> {
        anyhow::bail!("disk I/O error")
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub coordinator: Arc<SyncCoordinator>,
    pub ledger: PaymentLedger,
    pub local: Arc<SqlitePaymentStore>,
    pub remote: Arc<FakeRemote>,
    pub auth: Arc<FakeAuth>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub async fn new() -> Self {
        let pool = DatabasePool::in_memory()
            .await
            .expect("Failed to create in-memory database");
        let local = Arc::new(SqlitePaymentStore::new(pool.pool().clone()));
        let remote = Arc::new(FakeRemote::default());
        let auth = Arc::new(FakeAuth::signed_in(user()));
        let sink = Arc::new(RecordingSink::default());

        let coordinator = Arc::new(
            SyncCoordinator::new(local.clone(), remote.clone(), auth.clone())
                .with_event_sink(sink.clone()),
        );
        let ledger = PaymentLedger::new(coordinator.clone());

        Self {
            coordinator,
            ledger,
            local,
            remote,
            auth,
            sink,
        }
    }

    /// Writes directly to the local store, bypassing the ledger
    pub async fn seed(&self, payment: &Payment) {
        self.local.upsert(payment).await.unwrap();
    }

    pub async fn stored(&self, id: &PaymentId) -> Option<Payment> {
        self.local.fetch_by_id(id).await.unwrap()
    }
}

/// Polls `check` until it holds, failing the test after five seconds
pub async fn eventually<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
