// src/monitor/mod.rs

//! Lease monitor: periodic reclaim of expired task leases.
//!
//! The monitor owns no state of its own. Each tick it asks the store to reap
//! expired leases; the store decides, under its lock, whether a task goes
//! back to the ready queue or fails its expression with a timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::store::{LeaseReport, SchedulerStore};

#[derive(Debug, Clone)]
pub struct LeaseMonitor {
    store: Arc<SchedulerStore>,
    interval: Duration,
}

impl LeaseMonitor {
    pub fn new(store: Arc<SchedulerStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Run [`LeaseMonitor::run`] on the current Tokio runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Tick until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_ms = self.interval.as_millis() as u64, "lease monitor started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("lease monitor stopped");
    }

    /// One reclaim pass.
    pub fn sweep(&self) -> LeaseReport {
        let report = self.store.reap_expired();
        if report.is_empty() {
            return report;
        }

        if !report.failed.is_empty() {
            warn!(
                failed = ?report.failed,
                expressions = ?report.settled,
                "tasks exhausted their retry budget"
            );
        }
        debug!(
            requeued = report.requeued.len(),
            failed = report.failed.len(),
            released = report.released.len(),
            "lease sweep finished"
        );
        report
    }
}
