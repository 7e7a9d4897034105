// src/exec/broker.rs

//! Worker-facing task protocol.
//!
//! Workers talk to a `TaskBroker` instead of the store directly. The store
//! implements it in-process; a transport client could implement it over the
//! network, and tests can wrap it to inject faults.

use crate::dag::TaskSnapshot;
use crate::errors::Result;
use crate::store::{Ack, SchedulerStore};
use crate::types::TaskId;

/// Pull-based task source plus result sink.
pub trait TaskBroker: Send + Sync {
    /// Lease the next ready task, or fail with `CalcError::NoTaskAvailable`.
    fn next_task(&self) -> Result<TaskSnapshot>;

    /// Report the value computed for a leased task.
    fn submit_result(&self, task: TaskId, value: f64) -> Result<Ack>;
}

impl TaskBroker for SchedulerStore {
    fn next_task(&self) -> Result<TaskSnapshot> {
        SchedulerStore::next_task(self)
    }

    fn submit_result(&self, task: TaskId, value: f64) -> Result<Ack> {
        SchedulerStore::submit_result(self, task, value)
    }
}
