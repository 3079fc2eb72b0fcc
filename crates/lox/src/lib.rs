//! A tree-walking interpreter for a small class-based scripting language:
//! scanner, recursive-descent parser, static scope resolver, and a
//! mark-and-sweep heap backing the evaluator.

pub mod ast;
pub mod builtins;
pub mod class;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod function;
pub mod heap;
pub mod interpreter;
pub mod io;
pub mod parser;
pub mod resolver;
pub mod runtime;
pub mod scanner;
pub mod token;
pub mod value;

pub use diagnostics::{CollectingSink, DiagnosticSink, PrintingSink};
pub use error::{RuntimeError, Signal};
pub use io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint};
pub use runtime::Runtime;
pub use value::Value;

/// Scans, parses, resolves, and evaluates `source` against `runtime`'s
/// existing global scope, reporting every failure through `sink` as it's
/// found rather than stopping at the first one (except between pipeline
/// stages: a script with syntax errors is never resolved, and one with
/// resolve errors is never run).
///
/// Returns `true` if the script completed without a syntax, resolve, or
/// runtime error.
pub fn run(
    source: &str,
    runtime: &mut Runtime,
    sink: &mut dyn DiagnosticSink,
    print: &mut dyn io::PrintWriter,
) -> bool {
    let tokens = scanner::Scanner::new(source).scan_tokens(sink);
    let statements = parser::Parser::new(tokens, sink).parse();
    if sink.had_error() {
        return false;
    }

    resolver::Resolver::new(sink).resolve(&statements);
    if sink.had_error() {
        return false;
    }

    interpreter::run(runtime, &statements, sink, print);
    !sink.had_runtime_error()
}
