// src/store/state.rs

//! Mutable state guarded by the store's lock.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::time::Instant;

use tracing::debug;

use crate::dag::{Task, TaskGraph, TaskStatus};
use crate::store::expression::{Expression, ExpressionStatus};
use crate::types::{ExpressionId, TaskId};

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    /// Keyed by monotonically allocated ids, so iteration is insertion order.
    pub expressions: BTreeMap<ExpressionId, Expression>,
    pub tasks: HashMap<TaskId, Task>,
    /// FIFO of tasks that became ready. May hold entries for expressions that
    /// settled after the entry was pushed; [`StoreState::pop_ready`] skips
    /// those.
    pub ready: VecDeque<TaskId>,
    /// Live leases ordered by deadline. Holds exactly the `Assigned` tasks,
    /// so reaping never looks at settled history.
    pub leases: BTreeSet<(Instant, TaskId)>,
    next_expression: u64,
}

impl StoreState {
    pub fn allocate_expression_id(&mut self) -> ExpressionId {
        self.next_expression += 1;
        ExpressionId(self.next_expression)
    }

    /// Register an expression with its graph and enqueue its ready leaves.
    ///
    /// Returns `true` if the expression is already settled (bare literal).
    pub fn register(&mut self, raw: &str, graph: TaskGraph) -> bool {
        let id = graph.expression();
        let mut expression = Expression::new(id, raw.to_string(), graph.root(), graph.len());

        let settled = match graph.literal() {
            Some(value) => {
                expression.status = ExpressionStatus::Done;
                expression.result = Some(value);
                true
            }
            None => false,
        };

        for task in graph.into_tasks() {
            if task.status == TaskStatus::Ready {
                self.ready.push_back(task.id);
            }
            self.tasks.insert(task.id, task);
        }
        self.expressions.insert(id, expression);

        settled
    }

    pub fn expression_is_terminal(&self, id: ExpressionId) -> bool {
        self.expressions
            .get(&id)
            .is_some_and(|e| e.status.is_terminal())
    }

    /// Pop the oldest ready task that may still be handed out.
    pub fn pop_ready(&mut self) -> Option<TaskId> {
        while let Some(id) = self.ready.pop_front() {
            let Some(task) = self.tasks.get(&id) else {
                continue;
            };
            if task.status != TaskStatus::Ready {
                continue;
            }
            if self.expression_is_terminal(id.expression) {
                debug!(task = %id, "dropping ready task of settled expression");
                continue;
            }
            return Some(id);
        }
        None
    }

    /// Record a lease handed out by `next_task`.
    pub fn track_lease(&mut self, deadline: Instant, id: TaskId) {
        self.leases.insert((deadline, id));
    }

    /// Forget the lease of `id`, if `deadline` says it had one.
    pub fn drop_lease(&mut self, deadline: Option<Instant>, id: TaskId) {
        if let Some(deadline) = deadline {
            self.leases.remove(&(deadline, id));
        }
    }

    /// Leases whose deadline lies strictly before `now`, oldest first.
    pub fn expired_leases(&self, now: Instant) -> Vec<(Instant, TaskId)> {
        self.leases
            .iter()
            .take_while(|(deadline, _)| *deadline < now)
            .copied()
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats {
            expressions: self.expressions.len(),
            ready_queue: self.ready.len(),
            assigned: self.leases.len(),
            ..StoreStats::default()
        };

        for expression in self.expressions.values() {
            match expression.status {
                ExpressionStatus::Pending => stats.pending += 1,
                ExpressionStatus::InProgress => stats.in_progress += 1,
                ExpressionStatus::Done => stats.done += 1,
                ExpressionStatus::Error => stats.error += 1,
            }
        }
        stats
    }
}

/// Point-in-time counters, for logging and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub expressions: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
    pub error: usize,
    /// Entries in the ready queue, including ones that will be skipped.
    pub ready_queue: usize,
    /// Tasks currently leased out.
    pub assigned: usize,
}
