// src/parser/ast.rs

use std::fmt;

use crate::types::Operation;

/// Binary expression tree produced by the parser.
///
/// Leaves are numeric literals; every internal node has exactly two children.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Literal(f64),
    Binary {
        op: Operation,
        left: Box<Ast>,
        right: Box<Ast>,
    },
}

impl Ast {
    pub fn binary(op: Operation, left: Ast, right: Ast) -> Self {
        Ast::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Number of internal nodes, i.e. the number of tasks the builder will
    /// allocate for this tree.
    pub fn operation_count(&self) -> usize {
        match self {
            Ast::Literal(_) => 0,
            Ast::Binary { left, right, .. } => {
                1 + left.operation_count() + right.operation_count()
            }
        }
    }
}

/// Fully parenthesised rendering, e.g. `((2 + 3) * 4)`.
impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ast::Literal(v) => write!(f, "{v}"),
            Ast::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
        }
    }
}
