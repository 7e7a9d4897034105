// src/store/propagate.rs

//! Result propagation: folding task outcomes into parents and expressions.

use tracing::{debug, info, warn};

use crate::dag::TaskStatus;
use crate::store::expression::ExpressionStatus;
use crate::store::state::StoreState;
use crate::types::{FailureReason, TaskId};

/// Structured result of a single propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationStep {
    /// Parents that became ready (and were enqueued) because of this step.
    pub newly_ready: Vec<TaskId>,
    /// Whether this step moved the owning expression to `done` or `error`.
    pub expression_settled: bool,
}

/// Applies task outcomes to the borrowed store state.
///
/// Callers hold the store lock for the lifetime of the propagator, so each
/// step is atomic with respect to the ready queue.
pub(crate) struct Propagator<'a> {
    state: &'a mut StoreState,
}

impl<'a> Propagator<'a> {
    pub fn new(state: &'a mut StoreState) -> Self {
        Self { state }
    }

    /// Record `value` for `task_id` and feed it into the parent slot.
    ///
    /// - Root task: the expression is done with `value` as its result.
    /// - Otherwise: the parent's pending operand is replaced; if that was the
    ///   last pending operand, the parent moves `Blocked -> Ready` and joins
    ///   the tail of the ready queue.
    ///
    /// For tasks of an already settled expression only the task itself is
    /// updated.
    pub fn complete(&mut self, task_id: TaskId, value: f64) -> PropagationStep {
        let mut step = PropagationStep::default();

        let (parent, lease) = match self.state.tasks.get_mut(&task_id) {
            Some(task) => {
                task.status = TaskStatus::Done;
                task.value = Some(value);
                (task.parent, task.lease_deadline.take())
            }
            None => {
                warn!(task = %task_id, "completion for unknown task; ignoring");
                return step;
            }
        };

        self.state.drop_lease(lease, task_id);

        let expression_id = task_id.expression;
        if self.state.expression_is_terminal(expression_id) {
            debug!(
                task = %task_id,
                expression = %expression_id,
                "late result for settled expression; bookkeeping only"
            );
            return step;
        }

        let Some(parent_id) = parent else {
            if let Some(expression) = self.state.expressions.get_mut(&expression_id) {
                expression.status = ExpressionStatus::Done;
                expression.result = Some(value);
                step.expression_settled = true;
                info!(expression = %expression_id, result = value, "expression done");
            }
            return step;
        };

        let Some(parent_task) = self.state.tasks.get_mut(&parent_id) else {
            warn!(task = %task_id, parent = %parent_id, "parent task missing from store");
            return step;
        };

        if !parent_task.resolve_operand(task_id, value) {
            warn!(
                task = %task_id,
                parent = %parent_id,
                "parent has no pending operand for this task"
            );
            return step;
        }

        if parent_task.status == TaskStatus::Blocked && parent_task.resolved_operands().is_some() {
            parent_task.status = TaskStatus::Ready;
            self.state.ready.push_back(parent_id);
            step.newly_ready.push(parent_id);
            debug!(task = %parent_id, "operands resolved; task ready");
        }

        step
    }

    /// Mark `task_id` failed and fail its expression with the same reason.
    ///
    /// Other tasks of the graph are left in place; the ready queue skips
    /// them from now on.
    pub fn fail(&mut self, task_id: TaskId, reason: FailureReason) -> PropagationStep {
        let mut step = PropagationStep::default();

        let lease = match self.state.tasks.get_mut(&task_id) {
            Some(task) => {
                task.status = TaskStatus::Error;
                task.failure = Some(reason);
                task.lease_deadline.take()
            }
            None => {
                warn!(task = %task_id, "failure for unknown task; ignoring");
                return step;
            }
        };
        self.state.drop_lease(lease, task_id);

        let expression_id = task_id.expression;
        if self.state.expression_is_terminal(expression_id) {
            debug!(
                task = %task_id,
                expression = %expression_id,
                %reason,
                "task of settled expression failed; bookkeeping only"
            );
            return step;
        }

        if let Some(expression) = self.state.expressions.get_mut(&expression_id) {
            expression.status = ExpressionStatus::Error;
            expression.error_detail = Some(reason);
            step.expression_settled = true;
            warn!(
                expression = %expression_id,
                task = %task_id,
                %reason,
                "expression failed"
            );
        }

        step
    }
}
