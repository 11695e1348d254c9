//! buildrun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Process spawning
//! - Filesystem access
//! - Runtime specifics
//!
//! Everything here can be unit-tested without a shell.

pub mod commands;
pub mod error;
pub mod platform;
pub mod status;
pub mod target;
pub mod task;

// Re-export commonly used types
pub use commands::{build_server_commands, ServerBuildPlan};
pub use error::CoreError;
pub use platform::{HostPlatform, Shell};
pub use status::TaskStatus;
pub use target::{Target, TargetArch, TargetOs};
pub use task::{BuildOutcome, CopySpec, Task, TaskResult};
