// src/dag/mod.rs

//! Task graph representation.
//!
//! - [`builder`] lowers a parsed expression into tasks.
//! - [`graph`] holds one expression's tasks and their parent links.
//! - [`task_info`] provides task records and the worker-facing snapshot.

pub mod builder;
pub mod graph;
pub mod task_info;

pub use builder::build;
pub use graph::TaskGraph;
pub use task_info::{Operand, Task, TaskSnapshot, TaskStatus};
