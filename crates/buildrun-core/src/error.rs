//! Core domain errors.

use thiserror::Error;

/// Core domain errors for buildrun.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Host platform name not recognized.
    #[error("Unknown host platform: {0}")]
    UnknownPlatform(String),

    /// Target operating system not supported.
    #[error("Unsupported target OS: {0}")]
    UnknownTargetOs(String),

    /// Target architecture not supported.
    #[error("Unsupported target architecture: {0}")]
    UnknownTargetArch(String),

    /// Target tuple not in `os/arch` form.
    #[error("Invalid target '{0}', expected <os>/<arch>")]
    InvalidTarget(String),

    /// Server directory cannot be written into a `cd` command.
    #[error("Invalid server directory '{0}': {1}")]
    InvalidServerDir(String, &'static str),
}
