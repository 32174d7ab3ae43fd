//! CLI subcommands and the adapter wiring they share

pub mod auth;
pub mod clear;
pub mod payments;
pub mod status;
pub mod sync;
pub mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use paysync_cache::{DatabasePool, SqlitePaymentStore};
use paysync_core::config::Config;
use paysync_remote::{KeyringSessionStorage, RestClient, RestPaymentStore, SessionAuthProvider};
use paysync_sync::{PaymentLedger, SyncCoordinator, TracingEventSink};

/// Adapters wired together for one CLI invocation
pub struct App {
    pub config: Config,
    pub local: Arc<SqlitePaymentStore>,
    pub auth: Arc<SessionAuthProvider>,
    pub coordinator: Arc<SyncCoordinator>,
    pub ledger: PaymentLedger,
}

impl App {
    /// Opens the local database and builds the coordinator
    pub async fn open(config: Config) -> Result<Self> {
        let pool = DatabasePool::new(&config.storage.database_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to open database at {}",
                    config.storage.database_path.display()
                )
            })?;
        let local = Arc::new(SqlitePaymentStore::new(pool.pool().clone()));

        let auth = Arc::new(SessionAuthProvider::new(Arc::new(
            KeyringSessionStorage::new(),
        )));
        let client =
            RestClient::new(&config.remote, auth.clone()).context("Failed to create HTTP client")?;
        let remote = Arc::new(RestPaymentStore::new(client, config.remote.table.clone()));

        let coordinator = Arc::new(
            SyncCoordinator::new(local.clone(), remote, auth.clone())
                .with_event_sink(Arc::new(TracingEventSink)),
        );
        let pending = coordinator
            .update_pending_sync_count()
            .await
            .context("Failed to read pending changes")?;
        debug!(pending, "Local store ready");

        let ledger = PaymentLedger::new(coordinator.clone());

        Ok(Self {
            config,
            local,
            auth,
            coordinator,
            ledger,
        })
    }
}
