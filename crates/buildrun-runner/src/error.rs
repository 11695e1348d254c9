//! Error types for running tasks and collecting artifacts.

use std::path::PathBuf;

use buildrun_core::BuildOutcome;
use thiserror::Error;

/// Errors returned by [`ParallelRunner::run`](crate::ParallelRunner::run).
#[derive(Debug, Error)]
pub enum RunError {
    /// At least one task did not succeed.
    #[error("{} task(s) failed: {}", .0.failures.len(), describe_failures(.0))]
    TasksFailed(BuildOutcome),

    /// A supervisor task panicked or was cancelled by the runtime.
    #[error("Task supervisor aborted: {0}")]
    Supervisor(String),
}

impl RunError {
    /// The aggregate outcome, when the failure came from task exits.
    pub fn outcome(&self) -> Option<&BuildOutcome> {
        match self {
            Self::TasksFailed(outcome) => Some(outcome),
            Self::Supervisor(_) => None,
        }
    }
}

fn describe_failures(outcome: &BuildOutcome) -> String {
    outcome
        .failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors returned by [`ArtifactCollector::collect`](crate::ArtifactCollector::collect).
#[derive(Debug, Error)]
pub enum CollectError {
    /// A copy source does not exist.
    #[error("Source directory not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// A copy source exists but is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Filesystem error while creating or copying a path.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CollectError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
