// src/store/lease.rs

//! Reclaiming expired leases.

use std::time::Instant;

use tracing::{debug, info};

use crate::dag::TaskStatus;
use crate::store::propagate::Propagator;
use crate::store::state::StoreState;
use crate::types::{ExpressionId, FailureReason, TaskId};

/// What a single reap pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaseReport {
    /// Tasks put back at the tail of the ready queue.
    pub requeued: Vec<TaskId>,
    /// Tasks that ran out of retries.
    pub failed: Vec<TaskId>,
    /// Tasks of already settled expressions whose lease was simply dropped.
    pub released: Vec<TaskId>,
    /// Expressions that moved to `error` during this pass.
    pub settled: Vec<ExpressionId>,
}

impl LeaseReport {
    pub fn is_empty(&self) -> bool {
        self.requeued.is_empty() && self.failed.is_empty() && self.released.is_empty()
    }
}

/// Reclaim every `Assigned` task whose deadline lies strictly before `now`.
///
/// Only the lease index is consulted, so the cost follows the number of
/// live leases rather than every task ever submitted. Expired tasks are
/// handled oldest deadline first, so their order in the ready queue matches
/// the order in which they were leased.
pub(crate) fn reap_expired(state: &mut StoreState, now: Instant, max_retries: u32) -> LeaseReport {
    let mut report = LeaseReport::default();

    for (deadline, id) in state.expired_leases(now) {
        state.leases.remove(&(deadline, id));
        let settled = state.expression_is_terminal(id.expression);

        let Some(task) = state.tasks.get_mut(&id) else {
            continue;
        };
        if task.status != TaskStatus::Assigned || task.lease_deadline != Some(deadline) {
            debug!(task = %id, "lease index entry out of date; skipping");
            continue;
        }
        task.retry_count += 1;
        task.lease_deadline = None;
        let expiries = task.retry_count;

        if settled {
            task.status = TaskStatus::Ready;
            debug!(task = %id, "lease expired for task of settled expression; released");
            report.released.push(id);
            continue;
        }

        if expiries > max_retries {
            let step = Propagator::new(state).fail(id, FailureReason::Timeout { expiries });
            report.failed.push(id);
            if step.expression_settled {
                report.settled.push(id.expression);
            }
            continue;
        }

        task.status = TaskStatus::Ready;
        state.ready.push_back(id);
        info!(
            task = %id,
            retry = expiries,
            max_retries,
            "lease expired; task re-queued"
        );
        report.requeued.push(id);
    }

    report
}
