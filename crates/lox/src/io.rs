//! Where `print` output goes. Kept as a pluggable trait, the same shape as
//! the teacher's `PrintWriter`, so tests can assert on exact output instead
//! of racing the process's real stdout.

/// Receives one line of program output at a time (the interpreter always
/// calls this with the text `print`'s argument stringifies to, newline
/// appended by the implementation).
pub trait PrintWriter {
    fn print_line(&mut self, text: &str);
}

/// Writes straight to the process's standard output. What the CLI uses.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn print_line(&mut self, text: &str) {
        println!("{text}");
    }
}

/// Discards everything. Useful when embedding the interpreter somewhere
/// that doesn't want script output at all.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn print_line(&mut self, _text: &str) {}
}

/// Buffers every line (newline-terminated) into a `String`, for tests that
/// assert on a script's exact stdout.
#[derive(Debug, Default)]
pub struct CollectStringPrint {
    pub output: String,
}

impl PrintWriter for CollectStringPrint {
    fn print_line(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }
}
