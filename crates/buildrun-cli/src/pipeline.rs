//! Build, then collect.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use buildrun_core::{BuildOutcome, CopySpec, Task};
use buildrun_runner::{ArtifactCollector, CollectError, CollectReport, ParallelRunner, RunError};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::console::Console;

/// Errors that end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A build task failed; nothing was copied.
    #[error("Build failed: {0}")]
    Build(#[from] RunError),

    /// Copying artifacts failed after a successful build.
    #[error("Copy failed: {0}")]
    Collect(#[from] CollectError),

    /// The blocking copy job did not complete.
    #[error("Copy job aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Build(_) | Self::Aborted(_) => 1,
            Self::Collect(_) => 2,
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub outcome: BuildOutcome,
    pub copy: CollectReport,
    pub elapsed_ms: u64,
}

/// Client bundle and server cross-compile, run side by side, then merged
/// into one output directory.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: BuildConfig,
    shutdown: CancellationToken,
}

impl Pipeline {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Builder method to stop the builds when `shutdown` is cancelled.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// The two build tasks, both run from the project root.
    pub fn tasks(&self) -> Vec<Task> {
        vec![
            Task::new("client", self.config.client_command.clone()),
            Task::new("server", self.config.server.command_line(self.config.platform)),
        ]
    }

    /// Unified output directory.
    pub fn output_root(&self) -> PathBuf {
        self.config.root.join(&self.config.out_dir)
    }

    /// Client and server output trees, in that order.
    pub fn copy_specs(&self) -> Vec<CopySpec> {
        let root = &self.config.root;
        let out = self.output_root();
        vec![
            CopySpec::new(
                root.join(&self.config.client_dir).join("dist"),
                out.join("client"),
            ),
            CopySpec::new(
                root.join(&self.config.server.server_dir)
                    .join(&self.config.server.output_dir),
                out.join("server"),
            ),
        ]
    }

    /// Run both builds, then copy their outputs if and only if both succeeded.
    pub async fn run<W>(&self, console: Arc<Console<W>>) -> Result<PipelineReport, PipelineError>
    where
        W: Write + Send + 'static,
    {
        let started = Instant::now();
        let tasks = self.tasks();

        console.info("Start Building...");
        info!(
            root = %self.config.root.display(),
            platform = %self.config.platform,
            targets = self.config.server.targets.len(),
            "Starting build"
        );
        for task in &tasks {
            debug!(task = %task.name, command = %task.command, "Build task");
        }

        let runner = ParallelRunner::new(self.config.run_options(), console.clone())
            .with_shutdown(self.shutdown.clone());
        let results = runner.run(tasks).await?;
        console.info("✓ Build Completed.");

        console.info("Start Copying Dist Files...");
        let collector = ArtifactCollector::new(self.output_root());
        let specs = self.copy_specs();
        let copy = tokio::task::spawn_blocking(move || collector.collect(&specs))
            .await
            .map_err(|e| PipelineError::Aborted(e.to_string()))??;
        console.success("✓ Copy Completed.");

        Ok(PipelineReport {
            outcome: BuildOutcome::from_results(results),
            copy,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}
