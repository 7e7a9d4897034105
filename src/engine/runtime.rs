// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::exec::{WorkerStats, spawn_workers};
use crate::monitor::LeaseMonitor;
use crate::store::{Expression, SchedulerStore};
use crate::types::ExpressionId;

/// Background side of the scheduler: the lease monitor plus the in-process
/// worker pool, both driven against one shared store.
///
/// The store itself stays usable (and is the single source of truth) while
/// the runtime is up; the runtime only adds the actors that move tasks
/// forward.
pub struct Runtime {
    store: Arc<SchedulerStore>,
    shutdown_tx: watch::Sender<bool>,
    monitor: JoinHandle<()>,
    workers: Vec<JoinHandle<WorkerStats>>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("store", &self.store)
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// Spawn the lease monitor and `cfg.worker.computing_power` workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(cfg: &ConfigFile, store: Arc<SchedulerStore>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let monitor = LeaseMonitor::new(Arc::clone(&store), cfg.scheduler.lease_check_interval())
            .spawn(shutdown_rx.clone());
        let workers = spawn_workers(Arc::clone(&store), &cfg.worker, shutdown_rx);

        info!(workers = workers.len(), "calcdag runtime started");

        Self {
            store,
            shutdown_tx,
            monitor,
            workers,
        }
    }

    /// Wait until every listed expression is `done` or `error`, then return
    /// their final records in the given order.
    pub async fn wait_for(&self, ids: &[ExpressionId]) -> Vec<Expression> {
        loop {
            let notified = self.store.settled_notified();
            if self.store.is_settled(ids) {
                break;
            }
            debug!(stats = ?self.store.stats(), "waiting for expressions to settle");
            notified.await;
        }

        ids.iter()
            .filter_map(|id| self.store.get_expression(*id).ok())
            .collect()
    }

    /// Signal shutdown and wait for the monitor and all workers to stop.
    ///
    /// Returns the summed worker counters.
    pub async fn shutdown(self) -> Result<WorkerStats> {
        // Receivers may already be gone if every actor exited on its own.
        let _ = self.shutdown_tx.send(true);

        self.monitor.await.map_err(anyhow::Error::from)?;

        let mut total = WorkerStats::default();
        for handle in self.workers {
            let stats = handle.await.map_err(anyhow::Error::from)?;
            total.completed += stats.completed;
            total.rejected += stats.rejected;
            total.stale += stats.stale;
        }

        info!(?total, "calcdag runtime stopped");
        Ok(total)
    }
}
