use std::env;
use std::fs;
use std::process::ExitCode;

use lox::{DiagnosticSink, PrintingSink, Runtime, StdPrint};

const EX_DATAERR: u8 = 65;
const EX_SOFTWARE: u8 = 70;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        eprintln!("usage: lox <script>");
        return ExitCode::FAILURE;
    };

    let source = match read_file(file_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };

    run_file(&source)
}

fn run_file(source: &str) -> ExitCode {
    let mut runtime = Runtime::new();
    let mut sink = PrintingSink::default();
    lox::run(source, &mut runtime, &mut sink, &mut StdPrint);

    if sink.had_error() {
        ExitCode::from(EX_DATAERR)
    } else if sink.had_runtime_error() {
        ExitCode::from(EX_SOFTWARE)
    } else {
        ExitCode::SUCCESS
    }
}

fn read_file(file_path: &str) -> Result<String, String> {
    fs::read_to_string(file_path).map_err(|err| format!("Error reading {file_path}: {err}"))
}
