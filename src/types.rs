use std::fmt;

use serde::Deserialize;

/// Primitive binary operation executed by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    /// Map an operator character to an operation.
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operation::Add),
            '-' => Some(Operation::Subtract),
            '*' => Some(Operation::Multiply),
            '/' => Some(Operation::Divide),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Subtract => '-',
            Operation::Multiply => '*',
            Operation::Divide => '/',
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Operation::Add | Operation::Subtract => 1,
            Operation::Multiply | Operation::Divide => 2,
        }
    }

    /// Plain IEEE evaluation. Division by zero yields an infinity or NaN;
    /// rejecting that is the store's job, not the worker's.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Operation::Add => left + right,
            Operation::Subtract => left - right,
            Operation::Multiply => left * right,
            Operation::Divide => left / right,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        };
        f.write_str(name)
    }
}

/// Identifier of a submitted expression.
///
/// Allocated from a monotonically increasing counter, so ordering by id is
/// ordering by submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpressionId(pub u64);

impl fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a task.
///
/// Carries the owning expression so a worker can report a result by task id
/// alone. `index` is unique within the expression's graph; the root task is
/// always index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    pub expression: ExpressionId,
    pub index: u32,
}

impl TaskId {
    pub fn new(expression: ExpressionId, index: u32) -> Self {
        Self { expression, index }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.expression, self.index)
    }
}

/// Why a task (and therefore its expression) failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureReason {
    /// A division whose right operand resolved to zero.
    DivisionByZero,
    /// The worker reported an infinite or NaN value.
    NonFiniteResult,
    /// The lease expired more often than the retry budget allows.
    Timeout { expiries: u32 },
}

impl FailureReason {
    /// Arithmetic failures come from the values themselves, not from workers
    /// going missing.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            FailureReason::DivisionByZero | FailureReason::NonFiniteResult
        )
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::DivisionByZero => f.write_str("arithmetic error: division by zero"),
            FailureReason::NonFiniteResult => {
                f.write_str("arithmetic error: result is not a finite number")
            }
            FailureReason::Timeout { expiries } => {
                write!(f, "timeout: lease expired {expiries} times")
            }
        }
    }
}
