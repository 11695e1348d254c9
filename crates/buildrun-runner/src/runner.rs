//! Concurrent execution of build tasks.

use std::sync::Arc;

use buildrun_core::{BuildOutcome, Task, TaskResult, TaskStatus};
use chrono::Utc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::RunError;
use crate::options::RunOptions;
use crate::process::{Attempt, AttemptOutcome};
use crate::sink::{LineSink, OutputStream};

/// Runs tasks as concurrent OS processes.
///
/// Each task gets its own supervisor on the tokio runtime, which starts the
/// process, restarts it on failure and reports a [`TaskResult`]. Tasks are
/// terminated by the [`KillOthers`](crate::KillOthers) policy or when the
/// shutdown token is cancelled.
#[derive(Clone)]
pub struct ParallelRunner {
    options: Arc<RunOptions>,
    sink: Arc<dyn LineSink>,
    shutdown: CancellationToken,
}

impl ParallelRunner {
    /// Create a runner writing task output to `sink`.
    pub fn new(options: RunOptions, sink: Arc<dyn LineSink>) -> Self {
        Self {
            options: Arc::new(options),
            sink,
            shutdown: CancellationToken::new(),
        }
    }

    /// Builder method to kill every task once `shutdown` is cancelled.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// The options this runner was created with.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run every task to completion.
    ///
    /// Returns the per-task results in task order when all tasks succeed,
    /// or [`RunError::TasksFailed`] with the aggregate outcome otherwise.
    pub async fn run(&self, tasks: Vec<Task>) -> Result<Vec<TaskResult>, RunError> {
        let total = tasks.len();
        info!(
            tasks = total,
            kill_others = %self.options.kill_others,
            restart_tries = self.options.restart_tries,
            "Starting parallel run"
        );

        let cancel = self.shutdown.child_token();
        let mut set = JoinSet::new();

        for (index, task) in tasks.into_iter().enumerate() {
            let supervisor = Supervisor {
                prefix: self.options.render_prefix(&task, index),
                task,
                index,
                options: Arc::clone(&self.options),
                sink: Arc::clone(&self.sink),
                cancel: cancel.clone(),
            };
            set.spawn(supervisor.run());
        }

        let mut results = Vec::with_capacity(total);
        let mut aborted = None;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => {
                    if !cancel.is_cancelled()
                        && self.options.kill_others.triggers(result.succeeded())
                    {
                        warn!(
                            task = %result.name,
                            status = ?result.status,
                            "Terminating remaining tasks"
                        );
                        cancel.cancel();
                    }
                    results.push(result);
                }
                Err(e) => {
                    error!(error = %e, "Task supervisor aborted");
                    if self.options.kill_others.on_failure {
                        cancel.cancel();
                    }
                    aborted.get_or_insert_with(|| e.to_string());
                }
            }
        }

        if let Some(reason) = aborted {
            return Err(RunError::Supervisor(reason));
        }

        let outcome = BuildOutcome::from_results(results);
        if outcome.all_succeeded {
            info!(tasks = total, "All tasks succeeded");
            Ok(outcome.results)
        } else {
            warn!(failures = outcome.failures.len(), "Parallel run failed");
            Err(RunError::TasksFailed(outcome))
        }
    }
}

/// Owns one task for the duration of a run.
struct Supervisor {
    task: Task,
    index: usize,
    prefix: String,
    options: Arc<RunOptions>,
    sink: Arc<dyn LineSink>,
    cancel: CancellationToken,
}

impl Supervisor {
    async fn run(self) -> TaskResult {
        let started_at = Utc::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let attempt = Attempt {
                task: &self.task,
                prefix: &self.prefix,
                options: &self.options,
                sink: &self.sink,
                cancel: &self.cancel,
            };

            let (status, exit_code, error) = match attempt.run().await {
                AttemptOutcome::Exited { code, success } => {
                    self.lifecycle(&match code {
                        Some(code) => format!("{} exited with code {}", self.task.command, code),
                        None => format!("{} was terminated by a signal", self.task.command),
                    });
                    let status = if success {
                        TaskStatus::Succeeded
                    } else {
                        TaskStatus::Failed
                    };
                    (status, code, None)
                }
                AttemptOutcome::Killed => {
                    self.lifecycle(&format!("{} was killed", self.task.command));
                    (TaskStatus::Killed, None, None)
                }
                AttemptOutcome::Error(e) => {
                    self.lifecycle(&format!("{} failed to start: {}", self.task.command, e));
                    (TaskStatus::Failed, None, Some(e.to_string()))
                }
            };

            let exhausted = attempts > self.options.restart_tries;
            if status != TaskStatus::Failed || exhausted || self.cancel.is_cancelled() {
                return self.finish(started_at, attempts, status, exit_code, error);
            }

            warn!(
                task = %self.task.name,
                attempt = attempts,
                restart_tries = self.options.restart_tries,
                "Restarting failed task"
            );
            self.lifecycle(&format!(
                "restarting {} (retry {} of {})",
                self.task.command, attempts, self.options.restart_tries
            ));

            if !self.options.restart_delay.is_zero() {
                tokio::select! {
                    () = tokio::time::sleep(self.options.restart_delay) => {}
                    () = self.cancel.cancelled() => {
                        return self.finish(started_at, attempts, status, exit_code, error);
                    }
                }
            }
        }
    }

    fn finish(
        &self,
        started_at: chrono::DateTime<Utc>,
        attempts: u32,
        status: TaskStatus,
        exit_code: Option<i32>,
        error: Option<String>,
    ) -> TaskResult {
        info!(
            task = %self.task.name,
            status = ?status,
            exit_code = ?exit_code,
            attempts,
            "Task finished"
        );
        TaskResult {
            name: self.task.name.clone(),
            index: self.index,
            command: self.task.command.clone(),
            status,
            exit_code,
            attempts,
            started_at,
            finished_at: Utc::now(),
            error,
        }
    }

    fn lifecycle(&self, message: &str) {
        self.sink.line(&self.prefix, OutputStream::Lifecycle, message);
    }
}
