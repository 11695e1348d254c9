//! A single process attempt for a task.

use std::io;
use std::process::Stdio;
use std::sync::Arc;

use buildrun_core::Task;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::options::RunOptions;
use crate::sink::{LineSink, OutputStream};

/// How one process attempt ended.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    /// The process exited on its own. `code` is `None` when a signal ended it.
    Exited { code: Option<i32>, success: bool },

    /// The process was terminated by the kill policy.
    Killed,

    /// The process could not be started or waited on.
    Error(io::Error),
}

/// Everything an attempt borrows from its supervisor.
pub(crate) struct Attempt<'a> {
    pub task: &'a Task,
    pub prefix: &'a str,
    pub options: &'a RunOptions,
    pub sink: &'a Arc<dyn LineSink>,
    pub cancel: &'a CancellationToken,
}

impl Attempt<'_> {
    /// Spawn the task's command and wait for it, or kill it on cancellation.
    pub(crate) async fn run(&self) -> AttemptOutcome {
        let mut cmd = self.command();
        let working_dir = self.options.working_dir(self.task);

        debug!(
            task = %self.task.name,
            command = %self.task.command,
            working_dir = %working_dir.display(),
            "Spawning task process"
        );

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(task = %self.task.name, error = %e, "Failed to spawn task process");
                return AttemptOutcome::Error(e);
            }
        };

        info!(task = %self.task.name, pid = ?child.id(), "Task process spawned");

        let mut readers: Vec<JoinHandle<()>> = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(self.forward_lines(stdout, OutputStream::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(self.forward_lines(stderr, OutputStream::Stderr));
        }

        let waited = tokio::select! {
            status = child.wait() => Some(status),
            () = self.cancel.cancelled() => None,
        };

        match waited {
            Some(Ok(status)) => {
                // Drain remaining output before reporting the exit.
                for reader in readers {
                    let _ = reader.await;
                }
                debug!(task = %self.task.name, code = ?status.code(), "Task process exited");
                AttemptOutcome::Exited {
                    code: status.code(),
                    success: status.success(),
                }
            }
            Some(Err(e)) => {
                warn!(task = %self.task.name, error = %e, "Failed to wait for task process");
                let _ = kill_tree(&mut child).await;
                abort_all(readers);
                AttemptOutcome::Error(e)
            }
            None => {
                info!(task = %self.task.name, pid = ?child.id(), "Terminating task process");
                if let Err(e) = kill_tree(&mut child).await {
                    warn!(task = %self.task.name, error = %e, "Failed to signal task process");
                }
                let status = child.wait().await;
                // Anything that escaped the group may still hold the pipes open.
                abort_all(readers);
                match status {
                    Ok(status) if status.success() => AttemptOutcome::Exited {
                        code: status.code(),
                        success: true,
                    },
                    _ => AttemptOutcome::Killed,
                }
            }
        }
    }

    fn command(&self) -> Command {
        let shell = &self.options.shell;
        let mut cmd = Command::new(&shell.program);
        cmd.arg(&shell.command_flag);

        // cmd.exe does its own parsing; quoting the command would break it.
        #[cfg(windows)]
        cmd.raw_arg(&self.task.command);
        #[cfg(not(windows))]
        cmd.arg(&self.task.command);

        cmd.current_dir(self.options.working_dir(self.task))
            .envs(self.task.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // The shell leads a fresh process group so the whole tree can be
        // signalled at once.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }

    fn forward_lines<R>(&self, reader: R, stream: OutputStream) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let sink = Arc::clone(self.sink);
        let prefix = self.prefix.to_string();
        let task = self.task.name.clone();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf);
                        sink.line(&prefix, stream, line.trim_end_matches(['\r', '\n']));
                    }
                    Err(e) => {
                        warn!(task = %task, error = %e, "Error reading task output");
                        break;
                    }
                }
            }
        })
    }
}

/// Kill the task's shell together with every process it started.
async fn kill_tree(child: &mut Child) -> io::Result<()> {
    #[cfg(unix)]
    if let Some(pid) = child.id().and_then(|pid| libc::pid_t::try_from(pid).ok()) {
        // SAFETY: killpg has no memory-safety preconditions.
        if unsafe { libc::killpg(pid, libc::SIGKILL) } == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            return Err(err);
        }
    }

    #[cfg(windows)]
    if let Some(pid) = child.id() {
        let status = Command::new("taskkill")
            .args(["/T", "/F", "/PID"])
            .arg(pid.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(status) if status.success() => return Ok(()),
            Ok(status) => debug!(pid, code = ?status.code(), "taskkill did not succeed"),
            Err(e) => debug!(pid, error = %e, "taskkill could not be run"),
        }
    }

    child.start_kill()
}

fn abort_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        handle.abort();
    }
}
