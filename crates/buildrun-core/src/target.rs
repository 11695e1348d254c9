//! Cross-compilation target tuples.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Operating system a server binary is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    Linux,
    Darwin,
    Windows,
}

impl TargetOs {
    /// Value of the toolchain's target OS variable.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
        }
    }

    /// Suffix appended to executables for this OS.
    pub fn executable_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Linux | Self::Darwin => "",
        }
    }
}

impl FromStr for TargetOs {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "darwin" | "macos" => Ok(Self::Darwin),
            "windows" => Ok(Self::Windows),
            other => Err(CoreError::UnknownTargetOs(other.to_string())),
        }
    }
}

/// CPU architecture a server binary is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetArch {
    Amd64,
    Arm64,
}

impl TargetArch {
    /// Value of the toolchain's target architecture variable.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl FromStr for TargetArch {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amd64" | "x86_64" => Ok(Self::Amd64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            other => Err(CoreError::UnknownTargetArch(other.to_string())),
        }
    }
}

/// An (operating system, architecture) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub os: TargetOs,
    pub arch: TargetArch,
}

impl Target {
    pub const fn new(os: TargetOs, arch: TargetArch) -> Self {
        Self { os, arch }
    }

    /// The tuples the server ships for unless told otherwise.
    pub fn defaults() -> Vec<Target> {
        vec![
            Target::new(TargetOs::Linux, TargetArch::Amd64),
            Target::new(TargetOs::Darwin, TargetArch::Amd64),
            Target::new(TargetOs::Windows, TargetArch::Amd64),
        ]
    }

    /// Output file name for a binary built for this target,
    /// e.g. `FChat_windows_amd64.exe`.
    pub fn binary_file_name(&self, binary_name: &str) -> String {
        format!(
            "{}_{}_{}{}",
            binary_name,
            self.os.as_str(),
            self.arch.as_str(),
            self.os.executable_suffix()
        )
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os.as_str(), self.arch.as_str())
    }
}

impl FromStr for Target {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (os, arch) = s
            .split_once('/')
            .ok_or_else(|| CoreError::InvalidTarget(s.to_string()))?;
        Ok(Self::new(os.parse()?, arch.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_file_name() {
        let linux = Target::new(TargetOs::Linux, TargetArch::Amd64);
        let windows = Target::new(TargetOs::Windows, TargetArch::Amd64);
        assert_eq!(linux.binary_file_name("FChat"), "FChat_linux_amd64");
        assert_eq!(windows.binary_file_name("FChat"), "FChat_windows_amd64.exe");
    }

    #[test]
    fn test_parse_target() {
        let target: Target = "darwin/arm64".parse().unwrap();
        assert_eq!(target, Target::new(TargetOs::Darwin, TargetArch::Arm64));
        assert_eq!(target.to_string(), "darwin/arm64");

        assert_eq!(
            "linux".parse::<Target>(),
            Err(CoreError::InvalidTarget("linux".to_string()))
        );
        assert_eq!(
            "linux/mips".parse::<Target>(),
            Err(CoreError::UnknownTargetArch("mips".to_string()))
        );
    }

    #[test]
    fn test_default_targets() {
        let names: Vec<String> = Target::defaults().iter().map(|t| t.to_string()).collect();
        assert_eq!(names, vec!["linux/amd64", "darwin/amd64", "windows/amd64"]);
    }
}
