//! Runner options.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use buildrun_core::{Shell, Task};

/// When a finished task terminates the tasks still running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KillOthers {
    /// Kill siblings when a task fails for good.
    pub on_failure: bool,
    /// Kill siblings when a task succeeds.
    pub on_success: bool,
}

impl KillOthers {
    /// Never kill siblings.
    pub const NEVER: Self = Self {
        on_failure: false,
        on_success: false,
    };

    /// Kill siblings once a task fails after its retries.
    pub const ON_FAILURE: Self = Self {
        on_failure: true,
        on_success: false,
    };

    /// Whether a task finishing with `succeeded` triggers the policy.
    pub fn triggers(&self, succeeded: bool) -> bool {
        if succeeded {
            self.on_success
        } else {
            self.on_failure
        }
    }
}

impl FromStr for KillOthers {
    type Err = String;

    /// Parse a comma separated list of `failure` and `success`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut policy = Self::NEVER;
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "failure" => policy.on_failure = true,
                "success" => policy.on_success = true,
                other => {
                    return Err(format!(
                        "unknown kill condition '{other}', expected 'failure' or 'success'"
                    ))
                }
            }
        }
        Ok(policy)
    }
}

impl fmt::Display for KillOthers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.on_failure {
            parts.push("failure");
        }
        if self.on_success {
            parts.push("success");
        }
        write!(f, "{}", parts.join(","))
    }
}

/// Options shared by every task of a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Output prefix template. Supports `{name}`, `{index}` and `{command}`.
    pub prefix: String,

    /// Sibling termination policy.
    pub kill_others: KillOthers,

    /// How many times a failing task is started again.
    pub restart_tries: u32,

    /// Pause before each restart.
    pub restart_delay: Duration,

    /// Default working directory for tasks.
    pub cwd: PathBuf,

    /// Shell used to run command strings.
    pub shell: Shell,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            prefix: "{name}".to_string(),
            kill_others: KillOthers::ON_FAILURE,
            restart_tries: 0,
            restart_delay: Duration::ZERO,
            cwd: PathBuf::from("."),
            shell: Shell::default(),
        }
    }
}

impl RunOptions {
    /// Set the prefix template.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the kill policy.
    pub fn with_kill_others(mut self, kill_others: KillOthers) -> Self {
        self.kill_others = kill_others;
        self
    }

    /// Set the number of restarts per task.
    pub fn with_restart_tries(mut self, tries: u32) -> Self {
        self.restart_tries = tries;
        self
    }

    /// Set the delay before a restart.
    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Set the default working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Set the shell.
    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    /// Render the prefix for `task`, the `index`-th task of the run.
    pub fn render_prefix(&self, task: &Task, index: usize) -> String {
        let mut out = String::with_capacity(self.prefix.len() + task.name.len());
        let mut rest = self.prefix.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open..];
            let Some(close) = after.find('}') else {
                rest = after;
                break;
            };
            match &after[1..close] {
                "name" => out.push_str(&task.name),
                "index" => out.push_str(&index.to_string()),
                "command" => out.push_str(&task.command),
                _ => out.push_str(&after[..=close]),
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }

    /// Working directory for `task`.
    pub fn working_dir(&self, task: &Task) -> PathBuf {
        match &task.working_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.cwd.join(dir),
            None => self.cwd.clone(),
        }
    }
}
