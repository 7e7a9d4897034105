// src/parser/mod.rs

//! Expression parsing.
//!
//! - [`lexer`] turns the raw string into positioned tokens.
//! - [`ast`] holds the binary tree the task graph builder consumes.
//!
//! Grammar (recursive descent, left-associative loops):
//!
//! ```text
//! expr   := term   (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := NUMBER | '-' factor | '(' expr ')'
//! ```
//!
//! A unary minus in front of a literal folds into a negative literal. In
//! front of anything else it lowers to `0 - operand`, which costs one extra
//! subtraction task.

pub mod ast;
pub mod lexer;

pub use ast::Ast;

use crate::errors::SyntaxError;
use crate::types::Operation;
use lexer::{Token, TokenKind};

/// Maximum nesting of parentheses / unary minus.
pub const MAX_NESTING: usize = 256;

/// Maximum number of binary operations in one expression.
pub const MAX_OPERATIONS: usize = 4096;

/// Parse a raw expression into an [`Ast`].
///
/// No side effects; on failure nothing about the input is retained.
pub fn parse(raw: &str) -> Result<Ast, SyntaxError> {
    let tokens = lexer::tokenize(raw)?;
    if tokens.is_empty() {
        return Err(SyntaxError::Empty);
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
        operations: 0,
    };
    let ast = parser.expr()?;

    if let Some(tok) = parser.peek() {
        return Err(match tok.kind {
            TokenKind::RParen => SyntaxError::UnbalancedParenthesis { pos: tok.pos },
            _ => SyntaxError::UnexpectedToken {
                found: tok.describe(),
                pos: tok.pos,
            },
        });
    }

    Ok(ast)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
    operations: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.cursor).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.peek()?;
        self.cursor += 1;
        Some(tok)
    }

    /// Consume the next token if it is one of the given operators.
    fn eat_operator(&mut self, accepted: &[Operation]) -> Option<Operation> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Operator(op),
                ..
            }) if accepted.contains(&op) => {
                self.cursor += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn combine(&mut self, op: Operation, left: Ast, right: Ast) -> Result<Ast, SyntaxError> {
        self.operations += 1;
        if self.operations > MAX_OPERATIONS {
            return Err(SyntaxError::TooManyOperations {
                limit: MAX_OPERATIONS,
            });
        }
        Ok(Ast::binary(op, left, right))
    }

    fn expr(&mut self) -> Result<Ast, SyntaxError> {
        let mut left = self.term()?;
        while let Some(op) = self.eat_operator(&[Operation::Add, Operation::Subtract]) {
            let right = self.term()?;
            left = self.combine(op, left, right)?;
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Ast, SyntaxError> {
        let mut left = self.factor()?;
        while let Some(op) = self.eat_operator(&[Operation::Multiply, Operation::Divide]) {
            let right = self.factor()?;
            left = self.combine(op, left, right)?;
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<Ast, SyntaxError> {
        let tok = self.advance().ok_or(SyntaxError::UnexpectedEnd)?;

        match tok.kind {
            TokenKind::Number(v) => Ok(Ast::Literal(v)),
            TokenKind::Operator(Operation::Subtract) => {
                let operand = self.nested(|p| p.factor())?;
                match operand {
                    Ast::Literal(v) => Ok(Ast::Literal(-v)),
                    other => self.combine(Operation::Subtract, Ast::Literal(0.0), other),
                }
            }
            TokenKind::LParen => {
                let inner = self.nested(|p| p.expr())?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(SyntaxError::UnexpectedToken {
                        found: other.describe(),
                        pos: other.pos,
                    }),
                    None => Err(SyntaxError::UnbalancedParenthesis { pos: tok.pos }),
                }
            }
            TokenKind::Operator(_) | TokenKind::RParen => Err(SyntaxError::UnexpectedToken {
                found: tok.describe(),
                pos: tok.pos,
            }),
        }
    }

    fn nested<F>(&mut self, f: F) -> Result<Ast, SyntaxError>
    where
        F: FnOnce(&mut Self) -> Result<Ast, SyntaxError>,
    {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(SyntaxError::NestingTooDeep { limit: MAX_NESTING });
        }
        let result = f(self);
        self.depth -= 1;
        result
    }
}
