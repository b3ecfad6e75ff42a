//! Parse errors raised while turning source text into a [`Module`].
//!
//! [`Module`]: crate::domain::ast::Module

use thiserror::Error;

/// Parser error with its source position (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (line {line}, column {column})")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
}

/// Specific kinds of parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid syntax near '{near}'")]
    InvalidSyntax { near: String },
    #[error("missing '{0}'")]
    Missing(String),
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("too many nested blocks or parentheses (limit {0})")]
    TooDeeplyNested(usize),
    #[error("parser unavailable: {0}")]
    Unavailable(String),
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
