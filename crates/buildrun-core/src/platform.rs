//! Host platform detection and shell dialects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Shell dialect of the machine running the build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    /// `cmd.exe`: `set VAR=value` assignments, backslash paths.
    Windows,
    /// POSIX `sh`: inline `VAR=value` prefixes, forward slash paths.
    #[default]
    Posix,
}

impl HostPlatform {
    /// Detect the platform of the running process.
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an operating system identifier to a shell dialect.
    ///
    /// Anything that is not windows falls back to the posix dialect.
    pub fn from_os(os: &str) -> Self {
        match os.to_ascii_lowercase().as_str() {
            "windows" | "win32" => Self::Windows,
            _ => Self::Posix,
        }
    }

    /// Path separator used when writing paths into shell commands.
    pub fn path_separator(&self) -> char {
        match self {
            Self::Windows => '\\',
            Self::Posix => '/',
        }
    }

    /// Shell used to run task command strings.
    pub fn shell(&self) -> Shell {
        match self {
            Self::Windows => Shell::new("cmd", "/C"),
            Self::Posix => Shell::new("sh", "-c"),
        }
    }

    /// Join path segments with this platform's separator.
    pub fn join_path(&self, segments: &[&str]) -> String {
        segments.join(self.path_separator().to_string().as_str())
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::Posix => write!(f, "posix"),
        }
    }
}

impl FromStr for HostPlatform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows" | "win32" => Ok(Self::Windows),
            "posix" | "unix" | "linux" | "macos" | "darwin" => Ok(Self::Posix),
            other => Err(CoreError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Program and flag used to hand a command string to a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shell {
    /// Shell executable, looked up on PATH.
    pub program: String,

    /// Flag that makes the shell run the next argument as a command.
    pub command_flag: String,
}

impl Shell {
    /// Create a shell description.
    pub fn new(program: impl Into<String>, command_flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            command_flag: command_flag.into(),
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        HostPlatform::detect().shell()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_os() {
        assert_eq!(HostPlatform::from_os("windows"), HostPlatform::Windows);
        assert_eq!(HostPlatform::from_os("win32"), HostPlatform::Windows);
        assert_eq!(HostPlatform::from_os("linux"), HostPlatform::Posix);
        assert_eq!(HostPlatform::from_os("macos"), HostPlatform::Posix);
        assert_eq!(HostPlatform::from_os("plan9"), HostPlatform::Posix);
    }

    #[test]
    fn test_parse_platform() {
        assert_eq!("Windows".parse::<HostPlatform>(), Ok(HostPlatform::Windows));
        assert_eq!("darwin".parse::<HostPlatform>(), Ok(HostPlatform::Posix));
        assert_eq!(
            "beos".parse::<HostPlatform>(),
            Err(CoreError::UnknownPlatform("beos".to_string()))
        );
    }

    #[test]
    fn test_shell_and_paths() {
        assert_eq!(HostPlatform::Windows.shell(), Shell::new("cmd", "/C"));
        assert_eq!(HostPlatform::Posix.shell(), Shell::new("sh", "-c"));
        assert_eq!(HostPlatform::Windows.join_path(&["dist", "app"]), "dist\\app");
        assert_eq!(HostPlatform::Posix.join_path(&["dist", "app"]), "dist/app");
    }
}
