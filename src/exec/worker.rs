// src/exec/worker.rs

//! A single polling worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dag::TaskSnapshot;
use crate::errors::CalcError;
use crate::exec::broker::TaskBroker;
use crate::store::SubmitOutcome;

/// Counters returned when a worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Results the store applied.
    pub completed: usize,
    /// Results the store refused (division by zero, non-finite values).
    pub rejected: usize,
    /// Results that arrived after the lease was gone.
    pub stale: usize,
}

/// Polls a [`TaskBroker`], spends the advertised operation time on each task,
/// then reports the computed value.
pub struct Worker<B: TaskBroker + ?Sized> {
    id: usize,
    broker: Arc<B>,
    poll_interval: Duration,
}

impl<B: TaskBroker + ?Sized> Worker<B> {
    pub fn new(id: usize, broker: Arc<B>, poll_interval: Duration) -> Self {
        Self {
            id,
            broker,
            poll_interval,
        }
    }

    /// Poll until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// A task in flight at shutdown is abandoned without a result; its lease
    /// expires and the lease monitor re-queues it.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> WorkerStats {
        let mut stats = WorkerStats::default();
        debug!(worker = self.id, "worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.broker.next_task() {
                Ok(task) => {
                    if !self.execute(task, &mut shutdown, &mut stats).await {
                        break;
                    }
                }
                Err(CalcError::NoTaskAvailable) => {
                    if wait_or_shutdown(self.poll_interval, &mut shutdown).await {
                        break;
                    }
                }
                Err(err) => {
                    warn!(worker = self.id, error = %err, "polling for a task failed");
                    if wait_or_shutdown(self.poll_interval, &mut shutdown).await {
                        break;
                    }
                }
            }
        }

        debug!(worker = self.id, ?stats, "worker stopped");
        stats
    }

    /// Returns `false` if shutdown was requested mid-task.
    async fn execute(
        &self,
        task: TaskSnapshot,
        shutdown: &mut watch::Receiver<bool>,
        stats: &mut WorkerStats,
    ) -> bool {
        debug!(
            worker = self.id,
            task = %task.id,
            operation = %task.operation,
            operation_ms = task.operation_time.as_millis() as u64,
            "computing task"
        );

        if wait_or_shutdown(task.operation_time, shutdown).await {
            info!(worker = self.id, task = %task.id, "shutdown while computing; abandoning task");
            return false;
        }

        let value = task.compute();
        match self.broker.submit_result(task.id, value) {
            Ok(ack) => match ack.outcome {
                SubmitOutcome::Applied => stats.completed += 1,
                SubmitOutcome::Rejected(reason) => {
                    debug!(worker = self.id, task = %task.id, %reason, "result rejected by store");
                    stats.rejected += 1;
                }
            },
            Err(CalcError::StaleLease { status, .. }) => {
                warn!(
                    worker = self.id,
                    task = %task.id,
                    %status,
                    "lease lost before the result was submitted"
                );
                stats.stale += 1;
            }
            Err(err) => {
                warn!(worker = self.id, task = %task.id, error = %err, "submitting result failed");
            }
        }

        true
    }
}

/// Sleep for `duration`; returns `true` if shutdown was signalled first.
async fn wait_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}
