//! Error types for the zkcl front end

use std::fmt;
use thiserror::Error;
use zkcl_spec::SchemaError;

/// A position in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// 1-based line number
    pub line: usize,
    /// 1-based column number
    pub column: usize,
}

impl Span {
    /// Construct a span
    pub fn new(line: usize, column: usize) -> Self {
        Span { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single source-level error with its position
#[derive(Debug, Clone, Error)]
#[error("{span}: {message}")]
pub struct SyntaxError {
    /// Where the error occurred
    pub span: Span,
    /// What went wrong
    pub message: String,
}

impl SyntaxError {
    /// Construct a syntax error
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        SyntaxError {
            span,
            message: message.into(),
        }
    }
}

/// Compilation failure: either accumulated source errors or a schema
/// construction error
#[derive(Debug, Error)]
pub enum CompileError {
    /// One or more syntax / resolution errors
    #[error("{}", render(.0))]
    Syntax(Vec<SyntaxError>),

    /// Schema-level error while building the HIR
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl CompileError {
    /// The accumulated syntax errors, if any
    pub fn syntax_errors(&self) -> &[SyntaxError] {
        match self {
            CompileError::Syntax(errors) => errors,
            CompileError::Schema(_) => &[],
        }
    }
}

fn render(errors: &[SyntaxError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for front-end operations
pub type Result<T> = std::result::Result<T, CompileError>;
