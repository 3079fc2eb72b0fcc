//! The diagnostic sink: the interface every error-producing pass reports
//! through, so the core stays decoupled from how (or whether) a host
//! displays failures. Four channels, matching the four places the pipeline
//! can fail.

use std::fmt;

use crate::token::Token;

/// Receives categorized diagnostics from the scanner, parser, resolver, and
/// interpreter.
pub trait DiagnosticSink {
    /// A scan error with only a line number (no token was produced yet).
    fn syntax_line(&mut self, line: usize, message: &str);

    /// A parse error anchored to a specific token.
    fn syntax_token(&mut self, token: &Token, message: &str);

    /// A resolver error.
    fn resolve(&mut self, token: &Token, message: &str);

    /// A runtime error that unwound to the top-level driver.
    fn runtime(&mut self, token: &Token, message: &str);

    /// Whether any `syntax_*`/`resolve` diagnostic has been reported.
    fn had_error(&self) -> bool;

    /// Whether any `runtime` diagnostic has been reported.
    fn had_runtime_error(&self) -> bool;
}

/// A single recorded diagnostic, as stored by [`CollectingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] {}", self.line, self.message)
    }
}

/// A sink that buffers every diagnostic instead of printing it, used by
/// tests that want to assert on exact messages.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub syntax: Vec<Diagnostic>,
    pub resolve: Vec<Diagnostic>,
    pub runtime: Vec<Diagnostic>,
}

impl DiagnosticSink for CollectingSink {
    fn syntax_line(&mut self, line: usize, message: &str) {
        self.syntax.push(Diagnostic { line, message: message.to_owned() });
    }

    fn syntax_token(&mut self, token: &Token, message: &str) {
        self.syntax.push(Diagnostic { line: token.line, message: message.to_owned() });
    }

    fn resolve(&mut self, token: &Token, message: &str) {
        self.resolve.push(Diagnostic { line: token.line, message: message.to_owned() });
    }

    fn runtime(&mut self, token: &Token, message: &str) {
        self.runtime.push(Diagnostic { line: token.line, message: message.to_owned() });
    }

    fn had_error(&self) -> bool {
        !self.syntax.is_empty() || !self.resolve.is_empty()
    }

    fn had_runtime_error(&self) -> bool {
        !self.runtime.is_empty()
    }
}

/// A sink that reports straight to stderr as diagnostics arrive, matching
/// the CLI's eager-reporting style.
#[derive(Debug, Default)]
pub struct PrintingSink {
    had_error: bool,
    had_runtime_error: bool,
}

impl DiagnosticSink for PrintingSink {
    fn syntax_line(&mut self, line: usize, message: &str) {
        eprintln!("[line {line}] Error: {message}");
        self.had_error = true;
    }

    fn syntax_token(&mut self, token: &Token, message: &str) {
        if token.kind == crate::token::TokenKind::Eof {
            eprintln!("[line {}] Error at end: {}", token.line, message);
        } else {
            eprintln!("[line {}] Error at '{}': {}", token.line, token.lexeme, message);
        }
        self.had_error = true;
    }

    fn resolve(&mut self, token: &Token, message: &str) {
        eprintln!("[line {}] Error at '{}': {}", token.line, token.lexeme, message);
        self.had_error = true;
    }

    fn runtime(&mut self, token: &Token, message: &str) {
        eprintln!("{message}\n[line {}]", token.line);
        self.had_runtime_error = true;
    }

    fn had_error(&self) -> bool {
        self.had_error
    }

    fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }
}
