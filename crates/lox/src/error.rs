//! Runtime error type and the non-error control-flow signal.
//!
//! `return`/`break`/`continue` are unwinding tokens, not errors: they are
//! caught exclusively by the nearest enclosing function/loop construct and
//! never reach a [`crate::diagnostics::DiagnosticSink`]. Keeping them out of
//! `Result`'s error channel means ordinary error propagation with `?` can't
//! accidentally swallow a `return`.

use std::fmt;

use crate::token::Token;
use crate::value::Value;

/// A runtime fault: operand type errors, undefined names, arity mismatches,
/// and the like. Carries the offending token for line reporting.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        Self { token, message: message.into() }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result of executing a statement or block: either nothing unusual
/// happened, or we're unwinding toward a `return`/`break`/`continue` site.
#[derive(Debug, Clone)]
pub enum Signal {
    None,
    Return(Value),
    Break,
    Continue,
}

pub type RunResult<T> = Result<T, RuntimeError>;
