// src/exec/pool.rs

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::WorkerSection;
use crate::exec::broker::TaskBroker;
use crate::exec::worker::{Worker, WorkerStats};

/// Spawn `computing_power` workers on the current Tokio runtime.
///
/// All workers share `shutdown`; each handle yields that worker's counters.
pub fn spawn_workers<B>(
    broker: Arc<B>,
    cfg: &WorkerSection,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<WorkerStats>>
where
    B: TaskBroker + ?Sized + 'static,
{
    info!(
        workers = cfg.computing_power,
        poll_interval_ms = cfg.poll_interval_ms,
        "starting worker pool"
    );

    (0..cfg.computing_power)
        .map(|id| {
            let worker = Worker::new(id, Arc::clone(&broker), cfg.poll_interval());
            tokio::spawn(worker.run(shutdown.clone()))
        })
        .collect()
}
