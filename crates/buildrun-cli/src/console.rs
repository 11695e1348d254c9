//! Colored status lines for humans.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use buildrun_runner::{LineSink, OutputStream};

/// Severity of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Warn,
    Success,
    Error,
}

impl Level {
    /// ANSI foreground color code.
    pub fn color_code(&self) -> u8 {
        match self {
            Self::Info => 34,
            Self::Warn => 33,
            Self::Success => 32,
            Self::Error => 31,
        }
    }
}

/// Writes tagged status lines and task output to a sink.
pub struct Console<W: Write> {
    out: Mutex<W>,
    tag: String,
    color: bool,
}

impl Console<io::Stdout> {
    /// Console on standard output.
    pub fn stdout(tag: impl Into<String>, color: bool) -> Self {
        Self::new(io::stdout(), tag, color)
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, tag: impl Into<String>, color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            tag: tag.into(),
            color,
        }
    }

    /// Render a status line without writing it.
    pub fn format_line(&self, level: Level, message: &str) -> String {
        if self.color {
            format!("\x1B[{}m[{}] {}\x1B[0m", level.color_code(), self.tag, message)
        } else {
            format!("[{}] {}", self.tag, message)
        }
    }

    pub fn log(&self, level: Level, message: impl fmt::Display) {
        let line = self.format_line(level, &message.to_string());
        self.write_line(&line);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Level::Warn, message);
    }

    pub fn success(&self, message: impl fmt::Display) {
        self.log(Level::Success, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::Error, message);
    }

    /// Consume the console and return its sink.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_line(&self, line: &str) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}

/// Task output passes through uncolored so the tools' own colors survive.
impl<W: Write + Send> LineSink for Console<W> {
    fn line(&self, prefix: &str, _stream: OutputStream, line: &str) {
        self.write_line(&format!("[{}] {}", prefix, line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_colored_levels() {
        let console = Console::new(Vec::new(), "open-chat", true);
        console.info("Start Building...");
        console.warn("slow");
        console.success("✓ Copy Completed.");
        console.error(format!("{} failed", "client"));

        assert_eq!(
            output(console),
            "\x1B[34m[open-chat] Start Building...\x1B[0m\n\
             \x1B[33m[open-chat] slow\x1B[0m\n\
             \x1B[32m[open-chat] ✓ Copy Completed.\x1B[0m\n\
             \x1B[31m[open-chat] client failed\x1B[0m\n"
        );
    }

    #[test]
    fn test_plain_output() {
        let console = Console::new(Vec::new(), "buildrun", false);
        console.error(42);
        assert_eq!(output(console), "[buildrun] 42\n");
    }

    #[test]
    fn test_task_lines_are_prefixed() {
        let console = Console::new(Vec::new(), "buildrun", true);
        console.line("build-client", OutputStream::Stdout, "vite v5 building");
        assert_eq!(output(console), "[build-client] vite v5 building\n");
    }
}
