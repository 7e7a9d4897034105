// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::dag::TaskStatus;
use crate::types::{ExpressionId, TaskId};

/// Reasons an expression string is rejected before it enters the scheduler.
///
/// Positions are byte offsets into the raw input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("empty expression")]
    Empty,

    #[error("invalid character '{ch}' at position {pos}")]
    InvalidCharacter { ch: char, pos: usize },

    #[error("invalid number '{text}' at position {pos}")]
    InvalidNumber { text: String, pos: usize },

    #[error("unexpected '{found}' at position {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unbalanced parenthesis at position {pos}")]
    UnbalancedParenthesis { pos: usize },

    #[error("expression nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("expression has more than {limit} operations")]
    TooManyOperations { limit: usize },
}

#[derive(Error, Debug)]
pub enum CalcError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Expression not found: {0}")]
    ExpressionNotFound(ExpressionId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// A result arrived for a task that is not currently leased out. The
    /// submission was discarded.
    #[error("Stale lease: task {task} is {status}, result discarded")]
    StaleLease { task: TaskId, status: TaskStatus },

    #[error("No task available")]
    NoTaskAvailable,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CalcError>;
