// src/parser/lexer.rs

//! Tokenizer for arithmetic expressions.

use crate::errors::SyntaxError;
use crate::types::Operation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Operator(Operation),
    LParen,
    RParen,
}

/// A token plus the byte offset where it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}

impl Token {
    /// Source-like rendering used in error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Number(v) => v.to_string(),
            TokenKind::Operator(op) => op.symbol().to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
        }
    }
}

/// Split `input` into tokens, skipping whitespace.
///
/// Numbers are runs of ASCII digits with at most one decimal point
/// (`3`, `0.5`, `.5`, `2.`).
pub fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch.is_ascii_digit() || ch == '.' {
            let mut end = pos;
            while let Some(&(i, c)) = chars.peek() {
                if c.is_ascii_digit() || c == '.' {
                    end = i + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let text = &input[pos..end];
            let value = parse_number(text).ok_or_else(|| SyntaxError::InvalidNumber {
                text: text.to_string(),
                pos,
            })?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                pos,
            });
            continue;
        }

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            other => match Operation::from_symbol(other) {
                Some(op) => TokenKind::Operator(op),
                None => return Err(SyntaxError::InvalidCharacter { ch: other, pos }),
            },
        };
        tokens.push(Token { kind, pos });
        chars.next();
    }

    Ok(tokens)
}

fn parse_number(text: &str) -> Option<f64> {
    if text == "." || text.matches('.').count() > 1 {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}
