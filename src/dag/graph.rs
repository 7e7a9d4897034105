// src/dag/graph.rs

use std::collections::HashMap;
use std::time::Duration;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::dag::task_info::{Task, TaskStatus};
use crate::types::{ExpressionId, TaskId};

/// Task decomposition of one expression.
///
/// Tree-shaped: every task has at most one consumer, recorded as its
/// `parent`. Tasks are stored in post-order, so every task appears after the
/// tasks whose results it consumes.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    expression: ExpressionId,
    root: Option<TaskId>,
    tasks: Vec<Task>,
    /// Set instead of `root` when the expression is a bare literal.
    literal: Option<f64>,
}

impl TaskGraph {
    pub(crate) fn new(
        expression: ExpressionId,
        root: Option<TaskId>,
        tasks: Vec<Task>,
        literal: Option<f64>,
    ) -> Self {
        Self {
            expression,
            root,
            tasks,
            literal,
        }
    }

    pub fn expression(&self) -> ExpressionId {
        self.expression
    }

    /// The task whose result is the expression's result.
    pub fn root(&self) -> Option<TaskId> {
        self.root
    }

    /// Value of an expression that needs no tasks at all (e.g. `"42"`).
    pub fn literal(&self) -> Option<f64> {
        self.literal
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks that can be handed out immediately, in post-order.
    pub fn ready_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Ready)
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    /// Longest chain of operation times from any leaf task to the root.
    ///
    /// This is the lower bound on wall-clock time for the expression with
    /// unlimited workers that take exactly their operation time.
    pub fn critical_path(&self) -> Duration {
        // Edge direction: child -> parent (producer -> consumer).
        let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();
        let mut cost: HashMap<TaskId, Duration> = HashMap::new();

        for task in &self.tasks {
            graph.add_node(task.id);
            cost.insert(task.id, task.operation_time);
        }
        for task in &self.tasks {
            if let Some(parent) = task.parent {
                graph.add_edge(task.id, parent, ());
            }
        }

        let order = match toposort(&graph, None) {
            Ok(order) => order,
            Err(cycle) => {
                warn!(task = %cycle.node_id(), "cycle in task graph; no critical path");
                return Duration::ZERO;
            }
        };

        let mut finish: HashMap<TaskId, Duration> = HashMap::new();
        for id in order {
            let ready_at = graph
                .neighbors_directed(id, Direction::Incoming)
                .filter_map(|child| finish.get(&child).copied())
                .max()
                .unwrap_or(Duration::ZERO);
            let own = cost.get(&id).copied().unwrap_or(Duration::ZERO);
            finish.insert(id, ready_at + own);
        }

        finish.values().copied().max().unwrap_or(Duration::ZERO)
    }
}
