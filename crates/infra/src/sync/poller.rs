//! Background pull loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{PullOutcome, SyncCoordinator};

/// Periodically pulls remote changes through a [`SyncCoordinator`].
pub struct SyncPoller {
    coordinator: Arc<SyncCoordinator>,
    period: Duration,
}

/// Handle to a running poller. Dropping it leaves the loop running;
/// call [`SyncPollerHandle::shutdown`] to stop it.
pub struct SyncPollerHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SyncPoller {
    pub fn new(coordinator: Arc<SyncCoordinator>, period: Duration) -> Self {
        Self { coordinator, period }
    }

    /// Run one pull immediately, then keep pulling every `period` on a
    /// background task. Returns `None` when no remote is configured.
    pub async fn start(self) -> Option<SyncPollerHandle> {
        if !self.coordinator.is_configured() {
            info!("remote sync not configured; background pull disabled");
            return None;
        }

        pull_once(&self.coordinator).await;

        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();
        let Self { coordinator, period } = self;

        info!(period_secs = period.as_secs(), "background pull started");
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = signal.notified() => {
                        info!("background pull stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        pull_once(&coordinator).await;
                    }
                }
            }
        });

        Some(SyncPollerHandle { shutdown, task })
    }
}

impl SyncPollerHandle {
    /// Stop the loop and wait for it to exit. An in-progress pull finishes
    /// first.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        if let Err(e) = self.task.await {
            warn!(error = %e, "background pull task ended abnormally");
        }
    }
}

async fn pull_once(coordinator: &SyncCoordinator) {
    match coordinator.pull().await {
        Ok(PullOutcome::Pulled { branch }) => debug!(%branch, "pulled remote changes"),
        Ok(PullOutcome::Busy) => debug!("pull skipped; sync in progress"),
        Ok(PullOutcome::LocalChanges) => debug!("pull skipped; unsynced local comment edits"),
        Ok(PullOutcome::NotConfigured) => {}
        Err(e) => warn!(error = %e, "background pull failed"),
    }
}
