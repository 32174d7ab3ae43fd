//! Sync scheduler - runs passes on a timer and on demand
//!
//! The coordinator never retries by itself; the [`SyncScheduler`] is the
//! retry. It runs a pass every poll interval and whenever
//! [`request_sync()`](SyncScheduler::request_sync) is called, until its
//! cancellation token fires.
//!
//! ## Flow
//!
//! ```text
//! interval tick ──┐
//!                 ├──→ SyncScheduler ──→ SyncCoordinator::perform_sync_with_cancel
//! request_sync() ─┘          │
//!                      CancellationToken ──→ stop
//! ```
//!
//! Failed passes are logged and left in the coordinator state for observers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coordinator::SyncCoordinator;

/// Triggers sync passes periodically and on request
pub struct SyncScheduler {
    coordinator: Arc<SyncCoordinator>,
    interval: Duration,
    wake: Notify,
    cancel: CancellationToken,
}

impl SyncScheduler {
    /// Creates a scheduler that syncs every `interval`
    pub fn new(coordinator: Arc<SyncCoordinator>, interval: Duration) -> Self {
        info!(interval_secs = interval.as_secs(), "Creating sync scheduler");
        Self {
            coordinator,
            interval,
            wake: Notify::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Requests a pass now instead of at the next tick
    ///
    /// Requests made while a pass is running coalesce into one follow-up pass.
    pub fn request_sync(&self) {
        debug!("Sync requested");
        self.wake.notify_one();
    }

    /// Returns the token that stops the scheduler
    ///
    /// Cancelling it also stops a running pass at its next phase boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops the scheduler
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Main loop; the first pass runs immediately
    ///
    /// # Returns
    /// The number of passes started before shutdown
    pub async fn run(&self) -> u64 {
        info!("Sync scheduler starting");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut passes = 0u64;

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
                _ = self.wake.notified() => {}
            }

            passes += 1;
            match self
                .coordinator
                .perform_sync_with_cancel(&self.cancel)
                .await
            {
                Ok(report) => debug!(
                    pass = passes,
                    uploaded = report.uploaded,
                    downloaded = report.downloaded(),
                    "Scheduled pass finished"
                ),
                Err(e) => warn!(
                    pass = passes,
                    error = %e,
                    transient = e.is_transient(),
                    "Scheduled pass failed, retrying at next tick"
                ),
            }
        }

        info!(passes, "Sync scheduler stopped");
        passes
    }
}
