// src/dag/task_info.rs

//! Task records and the snapshot handed to workers.

use std::fmt;
use std::time::{Duration, Instant};

use crate::types::{FailureReason, Operation, TaskId};

/// One operand slot of a task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// Resolved numeric value.
    Value(f64),
    /// Waiting on the output of another task in the same graph.
    Pending(TaskId),
}

impl Operand {
    pub fn value(&self) -> Option<f64> {
        match self {
            Operand::Value(v) => Some(*v),
            Operand::Pending(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "{v}"),
            Operand::Pending(id) => write!(f, "<{id}>"),
        }
    }
}

/// Lifecycle of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// At least one operand is still pending.
    Blocked,
    /// Both operands resolved; waiting in the ready queue.
    Ready,
    /// Leased out to a worker.
    Assigned,
    Done,
    Error,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Blocked => "blocked",
            TaskStatus::Ready => "ready",
            TaskStatus::Assigned => "assigned",
            TaskStatus::Done => "done",
            TaskStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// A primitive binary operation within an expression's graph.
///
/// Only the scheduler store mutates these; everything outside it sees
/// clones.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub operation: Operation,
    pub left: Operand,
    pub right: Operand,
    pub status: TaskStatus,
    /// Set while `Assigned`.
    pub lease_deadline: Option<Instant>,
    /// Number of expired leases so far.
    pub retry_count: u32,
    /// The task whose operand slot this task's result fills. `None` for the
    /// root.
    pub parent: Option<TaskId>,
    /// Expected duration of the operation, surfaced to workers.
    pub operation_time: Duration,
    pub value: Option<f64>,
    pub failure: Option<FailureReason>,
}

impl Task {
    /// Both operands, if both are resolved.
    pub fn resolved_operands(&self) -> Option<(f64, f64)> {
        Some((self.left.value()?, self.right.value()?))
    }

    /// Replace the pending reference to `child` with its value.
    ///
    /// Returns `false` if neither slot referenced `child`.
    pub fn resolve_operand(&mut self, child: TaskId, value: f64) -> bool {
        let mut resolved = false;
        for slot in [&mut self.left, &mut self.right] {
            if *slot == Operand::Pending(child) {
                *slot = Operand::Value(value);
                resolved = true;
            }
        }
        resolved
    }
}

/// Description of a leased task, as handed to a worker by `next_task`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub operation: Operation,
    pub left: f64,
    pub right: f64,
    /// Informational; the lease deadline is derived from it.
    pub operation_time: Duration,
}

impl TaskSnapshot {
    /// Build a snapshot; `None` if an operand is still pending.
    pub fn from_task(task: &Task) -> Option<Self> {
        let (left, right) = task.resolved_operands()?;
        Some(Self {
            id: task.id,
            operation: task.operation,
            left,
            right,
            operation_time: task.operation_time,
        })
    }

    /// What an honest worker computes for this task.
    pub fn compute(&self) -> f64 {
        self.operation.apply(self.left, self.right)
    }
}
