// src/store/mod.rs

//! The scheduler store: single owner of all expression and task state.
//!
//! Every operation takes one global lock, so task transitions and ready
//! queue membership always change together. Two concurrent `next_task`
//! calls can therefore never lease the same task, and of two concurrent
//! submissions for one task exactly one finds it `Assigned`.
//!
//! - [`expression`] defines the expression record.
//! - [`propagate`] folds task outcomes into parents and expressions.
//! - [`lease`] reclaims expired leases for the lease monitor.

pub mod expression;
pub mod lease;
pub mod propagate;
mod state;

pub use expression::{Expression, ExpressionStatus};
pub use lease::LeaseReport;
pub use propagate::PropagationStep;
pub use state::StoreStats;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::Notify;
use tokio::sync::futures::Notified;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigFile, TimingSection};
use crate::dag::{self, TaskSnapshot, TaskStatus};
use crate::errors::{CalcError, Result};
use crate::parser;
use crate::types::{ExpressionId, FailureReason, Operation, TaskId};
use propagate::Propagator;
use state::StoreState;

/// What happened to an accepted result submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitOutcome {
    /// The value was stored and propagated.
    Applied,
    /// The value was refused and the task failed with this reason.
    Rejected(FailureReason),
}

/// Acknowledgement for a result submission that matched a live lease.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ack {
    pub task_id: TaskId,
    pub outcome: SubmitOutcome,
    /// Status of the owning expression after the submission.
    pub expression_status: ExpressionStatus,
}

/// Concurrency-safe holder of all expressions and tasks.
///
/// Create one per process and share it through an `Arc`.
#[derive(Debug)]
pub struct SchedulerStore {
    state: Mutex<StoreState>,
    timing: TimingSection,
    max_retries: u32,
    lease_grace: Duration,
    clock: Arc<dyn Clock>,
    /// Woken whenever an expression reaches `done` or `error`.
    settled: Notify,
}

impl SchedulerStore {
    /// Store using the system clock.
    pub fn new(cfg: &ConfigFile) -> Self {
        Self::with_clock(cfg, Arc::new(SystemClock))
    }

    pub fn with_clock(cfg: &ConfigFile, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            timing: cfg.timing,
            max_retries: cfg.scheduler.max_retries,
            lease_grace: cfg.scheduler.lease_grace(),
            clock,
            settled: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A panic while holding the lock leaves the state as it was at the
        // last completed transition; keep serving.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parse `raw`, build its task graph and register it.
    ///
    /// Nothing is registered if parsing fails.
    pub fn submit(&self, raw: &str) -> Result<ExpressionId> {
        let ast = parser::parse(raw).inspect_err(|err| {
            debug!(raw, error = %err, "rejecting expression");
        })?;

        let mut state = self.lock();
        let id = state.allocate_expression_id();
        let graph = dag::build(id, &ast, &self.timing);
        let ready = graph.ready_tasks().count();
        let tasks = graph.len();
        let settled = state.register(raw, graph);
        drop(state);

        info!(expression = %id, raw, tasks, ready, "expression submitted");
        if settled {
            self.settled.notify_waiters();
        }
        Ok(id)
    }

    pub fn get_expression(&self, id: ExpressionId) -> Result<Expression> {
        self.lock()
            .expressions
            .get(&id)
            .cloned()
            .ok_or(CalcError::ExpressionNotFound(id))
    }

    /// All expressions in submission order.
    pub fn list_expressions(&self) -> Vec<Expression> {
        self.lock().expressions.values().cloned().collect()
    }

    /// Current state of one task.
    pub fn get_task(&self, id: TaskId) -> Result<dag::Task> {
        self.lock()
            .tasks
            .get(&id)
            .cloned()
            .ok_or(CalcError::TaskNotFound(id))
    }

    /// Lease the oldest ready task.
    ///
    /// The lease deadline is `now + operation_time + lease_grace`.
    pub fn next_task(&self) -> Result<TaskSnapshot> {
        let now = self.clock.now();
        let mut state = self.lock();

        let id = state.pop_ready().ok_or(CalcError::NoTaskAvailable)?;

        let (snapshot, deadline) = {
            let task = state
                .tasks
                .get_mut(&id)
                .ok_or(CalcError::TaskNotFound(id))?;
            let snapshot = TaskSnapshot::from_task(task).ok_or_else(|| {
                CalcError::Other(anyhow!("task {id} was queued with unresolved operands"))
            })?;
            let deadline = now + task.operation_time + self.lease_grace;
            task.status = TaskStatus::Assigned;
            task.lease_deadline = Some(deadline);
            (snapshot, deadline)
        };
        state.track_lease(deadline, id);

        if let Some(expression) = state.expressions.get_mut(&id.expression) {
            if expression.status == ExpressionStatus::Pending {
                expression.status = ExpressionStatus::InProgress;
            }
        }

        debug!(
            task = %id,
            operation = %snapshot.operation,
            left = snapshot.left,
            right = snapshot.right,
            "task leased"
        );
        Ok(snapshot)
    }

    /// Accept a worker's result for `task_id`.
    ///
    /// Fails with [`CalcError::StaleLease`] unless the task is currently
    /// leased; such submissions change nothing. A division by zero or a
    /// non-finite value fails the task and its expression instead of being
    /// stored, and is still acknowledged.
    pub fn submit_result(&self, task_id: TaskId, value: f64) -> Result<Ack> {
        let mut state = self.lock();

        let task = state
            .tasks
            .get(&task_id)
            .ok_or(CalcError::TaskNotFound(task_id))?;

        if task.status != TaskStatus::Assigned {
            debug!(task = %task_id, status = %task.status, "stale result discarded");
            return Err(CalcError::StaleLease {
                task: task_id,
                status: task.status,
            });
        }

        let rejection = match (task.operation, task.right.value()) {
            (Operation::Divide, Some(divisor)) if divisor == 0.0 => {
                Some(FailureReason::DivisionByZero)
            }
            _ if !value.is_finite() => Some(FailureReason::NonFiniteResult),
            _ => None,
        };

        let step = {
            let mut propagator = Propagator::new(&mut state);
            match rejection {
                Some(reason) => propagator.fail(task_id, reason),
                None => propagator.complete(task_id, value),
            }
        };

        let expression_status = state
            .expressions
            .get(&task_id.expression)
            .map(|e| e.status)
            .ok_or(CalcError::ExpressionNotFound(task_id.expression))?;
        drop(state);

        if step.expression_settled {
            self.settled.notify_waiters();
        }

        let outcome = match rejection {
            Some(reason) => SubmitOutcome::Rejected(reason),
            None => SubmitOutcome::Applied,
        };
        if let SubmitOutcome::Rejected(reason) = outcome {
            warn!(task = %task_id, %reason, "result rejected");
        } else {
            debug!(task = %task_id, value, newly_ready = step.newly_ready.len(), "result applied");
        }

        Ok(Ack {
            task_id,
            outcome,
            expression_status,
        })
    }

    /// Reclaim expired leases: re-queue within the retry budget, fail the
    /// expression beyond it. Called periodically by the lease monitor.
    pub fn reap_expired(&self) -> LeaseReport {
        let now = self.clock.now();
        let report = lease::reap_expired(&mut self.lock(), now, self.max_retries);
        if !report.settled.is_empty() {
            self.settled.notify_waiters();
        }
        report
    }

    pub fn stats(&self) -> StoreStats {
        self.lock().stats()
    }

    /// Whether every listed expression is `done` or `error`. Unknown ids
    /// count as settled.
    pub fn is_settled(&self, ids: &[ExpressionId]) -> bool {
        let state = self.lock();
        ids.iter().all(|id| {
            state
                .expressions
                .get(id)
                .is_none_or(|e| e.status.is_terminal())
        })
    }

    /// Future resolved the next time any expression settles.
    ///
    /// Create it *before* checking [`SchedulerStore::is_settled`] so a
    /// settlement in between is not missed.
    pub fn settled_notified(&self) -> Notified<'_> {
        self.settled.notified()
    }
}
