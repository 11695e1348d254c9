//! Process-level build execution for buildrun.
//!
//! [`ParallelRunner`] spawns every task as its own shell process, streams
//! their output through a [`LineSink`] and aggregates exit codes into a
//! [`BuildOutcome`](buildrun_core::BuildOutcome). [`ArtifactCollector`]
//! merges the produced directories into one output tree afterwards.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use buildrun_core::Task;
//! use buildrun_runner::{ParallelRunner, RunOptions, StdoutSink};
//!
//! async fn build() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = ParallelRunner::new(
//!         RunOptions::default().with_prefix("build-{name}").with_restart_tries(1),
//!         Arc::new(StdoutSink),
//!     );
//!
//!     let results = runner
//!         .run(vec![
//!             Task::new("client", "pnpm run build:client"),
//!             Task::new("server", "cd ./server && go build -o dist/app"),
//!         ])
//!         .await?;
//!
//!     println!("{} tasks finished", results.len());
//!     Ok(())
//! }
//! ```

mod collector;
mod error;
mod options;
mod process;
mod runner;
mod sink;

pub use collector::{ArtifactCollector, CollectReport};
pub use error::{CollectError, RunError};
pub use options::{KillOthers, RunOptions};
pub use runner::ParallelRunner;
pub use sink::{LineSink, OutputStream, StdoutSink};
