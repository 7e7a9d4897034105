// src/dag/builder.rs

//! Lowering of an [`Ast`] into a [`TaskGraph`].

use tracing::debug;

use crate::config::TimingSection;
use crate::dag::graph::TaskGraph;
use crate::dag::task_info::{Operand, Task, TaskStatus};
use crate::parser::Ast;
use crate::types::{ExpressionId, TaskId};

/// Build the task graph for `ast`.
///
/// One task per internal node, allocated in a post-order walk; literal
/// leaves are embedded directly into their consumer's operand slot. A task
/// whose operands are both literal starts `Ready`, every other task starts
/// `Blocked`.
pub fn build(expression: ExpressionId, ast: &Ast, timing: &TimingSection) -> TaskGraph {
    if let Ast::Literal(v) = ast {
        debug!(expression = %expression, value = v, "bare literal; no tasks needed");
        return TaskGraph::new(expression, None, Vec::new(), Some(*v));
    }

    let mut builder = GraphBuilder {
        expression,
        timing,
        tasks: Vec::with_capacity(ast.operation_count()),
        next_index: 0,
    };

    let root = match builder.lower(ast, None) {
        Operand::Pending(id) => Some(id),
        Operand::Value(_) => None,
    };

    debug!(
        expression = %expression,
        tasks = builder.tasks.len(),
        "built task graph"
    );

    TaskGraph::new(expression, root, builder.tasks, None)
}

struct GraphBuilder<'a> {
    expression: ExpressionId,
    timing: &'a TimingSection,
    tasks: Vec<Task>,
    next_index: u32,
}

impl GraphBuilder<'_> {
    /// Lower `node` into an operand for `parent`.
    ///
    /// The id is reserved before the children are visited so they can record
    /// their parent; the task itself is pushed after them (post-order).
    fn lower(&mut self, node: &Ast, parent: Option<TaskId>) -> Operand {
        match node {
            Ast::Literal(v) => Operand::Value(*v),
            Ast::Binary { op, left, right } => {
                let id = TaskId::new(self.expression, self.next_index);
                self.next_index += 1;

                let left = self.lower(left, Some(id));
                let right = self.lower(right, Some(id));

                let status = if left.value().is_some() && right.value().is_some() {
                    TaskStatus::Ready
                } else {
                    TaskStatus::Blocked
                };

                self.tasks.push(Task {
                    id,
                    operation: *op,
                    left,
                    right,
                    status,
                    lease_deadline: None,
                    retry_count: 0,
                    parent,
                    operation_time: self.timing.operation_time(*op),
                    value: None,
                    failure: None,
                });

                Operand::Pending(id)
            }
        }
    }
}
