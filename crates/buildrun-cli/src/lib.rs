//! buildrun - parallel client/server build with artifact collection.
//!
//! The binary in `main.rs` is a thin wrapper around [`Pipeline`]; everything
//! here is usable (and tested) without going through the command line.

pub mod cli;
pub mod config;
pub mod console;
pub mod json_output;
pub mod pipeline;

pub use config::{BuildConfig, ConfigError};
pub use console::{Console, Level};
pub use pipeline::{Pipeline, PipelineError, PipelineReport};
