// src/store/expression.rs

use std::fmt;

use crate::types::{ExpressionId, FailureReason, TaskId};

/// Lifecycle of a submitted expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionStatus {
    /// Registered; no task handed to a worker yet.
    Pending,
    /// At least one task has been leased out.
    InProgress,
    Done,
    Error,
}

impl ExpressionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExpressionStatus::Done | ExpressionStatus::Error)
    }
}

impl fmt::Display for ExpressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExpressionStatus::Pending => "pending",
            ExpressionStatus::InProgress => "in_progress",
            ExpressionStatus::Done => "done",
            ExpressionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// A submitted expression and its evaluation state.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub id: ExpressionId,
    /// Input exactly as submitted.
    pub raw: String,
    pub status: ExpressionStatus,
    /// Only meaningful when `status == Done`.
    pub result: Option<f64>,
    /// Populated when `status == Error`.
    pub error_detail: Option<FailureReason>,
    /// `None` only for bare literals, which need no tasks.
    pub root_task_id: Option<TaskId>,
    pub task_count: usize,
}

impl Expression {
    pub(crate) fn new(
        id: ExpressionId,
        raw: String,
        root_task_id: Option<TaskId>,
        task_count: usize,
    ) -> Self {
        Self {
            id,
            raw,
            status: ExpressionStatus::Pending,
            result: None,
            error_detail: None,
            root_task_id,
            task_count,
        }
    }
}
