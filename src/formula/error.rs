//! Formula errors with byte-span diagnostics.

use std::fmt;

use thiserror::Error;

use crate::error::FitError;

/// Byte range in the expression source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Errors from lexing, parsing or name resolution of a formula.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("lex error at {span}: {message}")]
    Lex { message: String, span: Span },
    #[error("parse error at {span}: {message}")]
    Parse { message: String, span: Span },
    /// Unknown names, functions used as values, wrong arity.
    #[error("name error at {span}: {message}")]
    Resolve { message: String, span: Span },
}

impl From<FormulaError> for FitError {
    fn from(e: FormulaError) -> Self {
        FitError::Equation(e.to_string())
    }
}
