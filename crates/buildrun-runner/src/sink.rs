//! Destination for task output lines.

use std::io::{self, Write};

/// Where a line of task output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    Stdout,
    Stderr,
    /// Runner messages about the process itself (exit, restart, kill).
    Lifecycle,
}

/// Receives prefixed output lines from running tasks.
///
/// Lines from different tasks arrive interleaved, in no particular order.
pub trait LineSink: Send + Sync {
    /// Handle one line (without its trailing newline).
    fn line(&self, prefix: &str, stream: OutputStream, line: &str);
}

/// Writes `[prefix] line` to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn line(&self, prefix: &str, _stream: OutputStream, line: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "[{}] {}", prefix, line);
    }
}
