//! Server cross-compilation command construction.
//!
//! Commands are plain strings for the host shell. Nothing here runs them, so
//! both dialects can be checked on any machine.

use serde::{Deserialize, Serialize};

use crate::{CoreError, HostPlatform, Target};

/// Environment variable selecting the toolchain's target OS.
pub const TARGET_OS_VAR: &str = "GOOS";

/// Environment variable selecting the toolchain's target architecture.
pub const TARGET_ARCH_VAR: &str = "GOARCH";

/// Describes how the server is cross-compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerBuildPlan {
    /// Server source directory, relative to the build root.
    pub server_dir: String,

    /// Output directory, relative to the server directory.
    pub output_dir: String,

    /// Base name of the produced binaries.
    pub binary_name: String,

    /// Toolchain invocation, followed by `-o <path>`.
    pub toolchain: String,

    /// Target tuples, built in order.
    pub targets: Vec<Target>,
}

impl Default for ServerBuildPlan {
    fn default() -> Self {
        Self {
            server_dir: "server".to_string(),
            output_dir: "dist".to_string(),
            binary_name: "FChat".to_string(),
            toolchain: "go build".to_string(),
            targets: Target::defaults(),
        }
    }
}

impl ServerBuildPlan {
    /// Builder method to replace the target list.
    pub fn with_targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = targets;
        self
    }

    /// Builder method to set the toolchain invocation.
    pub fn with_toolchain(mut self, toolchain: impl Into<String>) -> Self {
        self.toolchain = toolchain.into();
        self
    }

    /// Builder method to set the binary base name.
    pub fn with_binary_name(mut self, binary_name: impl Into<String>) -> Self {
        self.binary_name = binary_name.into();
        self
    }

    /// Builder method to set the server source directory.
    pub fn with_server_dir(mut self, server_dir: impl Into<String>) -> Self {
        self.server_dir = server_dir.into();
        self
    }

    /// Check that the server directory can be written into `cd ./<dir>`.
    ///
    /// It must be relative to the build root and free of whitespace, since it
    /// is written into the command unquoted.
    pub fn validate(&self) -> Result<(), CoreError> {
        let dir = self.server_dir.as_str();
        let invalid = |reason| Err(CoreError::InvalidServerDir(dir.to_string(), reason));

        if dir.trim_matches(['/', '\\', '.']).is_empty() {
            return invalid("must name a directory under the root");
        }
        if dir.starts_with(['/', '\\']) || dir.chars().nth(1) == Some(':') {
            return invalid("must be relative to the root");
        }
        if dir.chars().any(char::is_whitespace) {
            return invalid("must not contain whitespace");
        }
        Ok(())
    }

    /// Ordered command list: change into the server directory, then one
    /// compile per target.
    pub fn commands(&self, platform: HostPlatform) -> Vec<String> {
        let mut commands = Vec::with_capacity(self.targets.len() + 1);
        commands.push(format!(
            "cd {}",
            normalize_path(platform, &format!("./{}", self.server_dir))
        ));
        commands.extend(
            self.targets
                .iter()
                .map(|target| self.compile_command(platform, target)),
        );
        commands
    }

    /// Every command joined into one shell command line.
    pub fn command_line(&self, platform: HostPlatform) -> String {
        self.commands(platform).join(" && ")
    }

    /// Output path of the binary for `target`, relative to the server directory.
    pub fn output_path(&self, platform: HostPlatform, target: &Target) -> String {
        let file_name = target.binary_file_name(&self.binary_name);
        normalize_path(platform, &format!("{}/{}", self.output_dir, file_name))
    }

    fn compile_command(&self, platform: HostPlatform, target: &Target) -> String {
        let output = self.output_path(platform, target);
        let os = target.os.as_str();
        let arch = target.arch.as_str();
        match platform {
            // No space before `&&`: cmd would keep it as part of the value.
            HostPlatform::Windows => format!(
                "set {TARGET_OS_VAR}={os}&& set {TARGET_ARCH_VAR}={arch}&& {} -o {output}",
                self.toolchain
            ),
            HostPlatform::Posix => format!(
                "{TARGET_OS_VAR}={os} {TARGET_ARCH_VAR}={arch} {} -o {output}",
                self.toolchain
            ),
        }
    }
}

/// Commands for the default server plan on `platform`.
pub fn build_server_commands(platform: HostPlatform) -> Vec<String> {
    ServerBuildPlan::default().commands(platform)
}

fn normalize_path(platform: HostPlatform, path: &str) -> String {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();
    platform.join_path(&segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TargetArch, TargetOs};

    #[test]
    fn test_posix_commands() {
        let commands = build_server_commands(HostPlatform::Posix);
        assert_eq!(
            commands,
            vec![
                "cd ./server",
                "GOOS=linux GOARCH=amd64 go build -o dist/FChat_linux_amd64",
                "GOOS=darwin GOARCH=amd64 go build -o dist/FChat_darwin_amd64",
                "GOOS=windows GOARCH=amd64 go build -o dist/FChat_windows_amd64.exe",
            ]
        );
    }

    #[test]
    fn test_windows_commands() {
        let commands = build_server_commands(HostPlatform::Windows);
        assert_eq!(commands[0], "cd .\\server");
        assert_eq!(
            commands[1],
            "set GOOS=linux&& set GOARCH=amd64&& go build -o dist\\FChat_linux_amd64"
        );
        for command in &commands[1..] {
            assert!(command.starts_with("set GOOS="));
            assert!(command.contains("&& set GOARCH="));
            assert!(!command.contains('/'));
        }
    }

    #[test]
    fn test_one_command_per_target() {
        for platform in [HostPlatform::Windows, HostPlatform::Posix] {
            let commands = build_server_commands(platform);
            assert_eq!(commands.len(), 4);
            for (os, suffix) in [("linux", ""), ("darwin", ""), ("windows", ".exe")] {
                let assignment = match platform {
                    HostPlatform::Windows => format!("set GOOS={os}&&"),
                    HostPlatform::Posix => format!("GOOS={os} "),
                };
                let matching: Vec<&String> =
                    commands.iter().filter(|c| c.contains(&assignment)).collect();
                assert_eq!(matching.len(), 1, "{platform} {os}");
                let expected_tail = format!("FChat_{os}_amd64{suffix}");
                assert!(matching[0].ends_with(&expected_tail));
            }
            let exe_count = commands.iter().filter(|c| c.ends_with(".exe")).count();
            assert_eq!(exe_count, 1);
        }
    }

    #[test]
    fn test_command_line_and_custom_plan() {
        let plan = ServerBuildPlan::default()
            .with_server_dir("backend/api")
            .with_binary_name("api")
            .with_toolchain("go build -trimpath")
            .with_targets(vec![Target::new(TargetOs::Linux, TargetArch::Arm64)]);

        assert_eq!(
            plan.command_line(HostPlatform::Posix),
            "cd ./backend/api && GOOS=linux GOARCH=arm64 go build -trimpath -o dist/api_linux_arm64"
        );
        assert_eq!(
            plan.commands(HostPlatform::Windows)[0],
            "cd .\\backend\\api"
        );
    }

    #[test]
    fn test_validate_server_dir() {
        let plan = |dir: &str| ServerBuildPlan::default().with_server_dir(dir);

        assert!(plan("server").validate().is_ok());
        assert!(plan("./backend/api").validate().is_ok());

        for dir in ["/opt/server", "\\\\host\\share", "C:\\server", "my server", "", "./"] {
            let err = plan(dir).validate().unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidServerDir(ref d, _) if d == dir),
                "{dir:?}"
            );
        }
    }

    #[test]
    fn test_no_targets() {
        let plan = ServerBuildPlan::default().with_targets(Vec::new());
        assert_eq!(plan.commands(HostPlatform::Posix), vec!["cd ./server"]);
    }
}
