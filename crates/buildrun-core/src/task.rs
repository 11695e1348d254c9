//! Task, result and copy types.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::TaskStatus;

/// A named shell command run as its own process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task name, used in output prefixes and reports.
    pub name: String,

    /// Command string handed to the host shell.
    pub command: String,

    /// Working directory. Relative paths resolve against the runner's
    /// default directory; `None` uses that directory as is.
    pub working_dir: Option<PathBuf>,

    /// Extra environment variables for the process.
    pub env: Vec<(String, String)>,
}

impl Task {
    /// Create a new Task.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            working_dir: None,
            env: Vec::new(),
        }
    }

    /// Builder method to set the working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Builder method to add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Outcome of one task after retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task name.
    pub name: String,

    /// Position of the task in the submitted list.
    pub index: usize,

    /// Command that was run.
    pub command: String,

    /// Final status.
    pub status: TaskStatus,

    /// Exit code of the last attempt. `None` if killed by a signal or never spawned.
    pub exit_code: Option<i32>,

    /// Number of processes started, including restarts.
    pub attempts: u32,

    /// When the first attempt started.
    pub started_at: DateTime<Utc>,

    /// When the last attempt finished.
    pub finished_at: DateTime<Utc>,

    /// Spawn error of the last attempt, if any.
    pub error: Option<String>,
}

impl TaskResult {
    /// Returns true if the task succeeded.
    pub fn succeeded(&self) -> bool {
        self.status.is_success()
    }

    /// Wall time from first start to last exit.
    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, self.exit_code, &self.error) {
            (TaskStatus::Killed, _, _) => write!(f, "{} (killed)", self.name),
            (_, _, Some(error)) => write!(f, "{} (failed to start: {})", self.name, error),
            (_, Some(code), None) => write!(f, "{} (exit code {})", self.name, code),
            (_, None, None) => write!(f, "{} (terminated by signal)", self.name),
        }
    }
}

/// Aggregate outcome of a parallel run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOutcome {
    /// True when every task succeeded.
    pub all_succeeded: bool,

    /// Every result, in task order.
    pub results: Vec<TaskResult>,

    /// Results that did not succeed, in task order.
    pub failures: Vec<TaskResult>,
}

impl BuildOutcome {
    /// Aggregate per-task results.
    pub fn from_results(mut results: Vec<TaskResult>) -> Self {
        results.sort_by_key(|r| r.index);
        let failures: Vec<TaskResult> =
            results.iter().filter(|r| !r.succeeded()).cloned().collect();
        Self {
            all_succeeded: failures.is_empty(),
            results,
            failures,
        }
    }
}

/// A directory tree to copy into the unified output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopySpec {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl CopySpec {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for CopySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.source.display(),
            self.destination.display()
        )
    }
}
