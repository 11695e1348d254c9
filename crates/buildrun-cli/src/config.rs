//! Build configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use buildrun_core::{CoreError, HostPlatform, ServerBuildPlan, Target};
use buildrun_runner::{KillOthers, RunOptions};
use thiserror::Error;

use crate::cli::Cli;

/// Errors turning command line arguments into a [`BuildConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Project root cannot be resolved.
    #[error("Project root '{}' not accessible: {source}", .path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Target or platform name rejected.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Kill policy string rejected.
    #[error("Invalid --kill-others value: {0}")]
    KillOthers(String),
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root; tasks run here.
    pub root: PathBuf,

    /// Unified output directory name, under the root.
    pub out_dir: String,

    /// Client directory name, under the root.
    pub client_dir: String,

    /// Command that bundles the client.
    pub client_command: String,

    /// How the server is cross-compiled.
    pub server: ServerBuildPlan,

    /// Shell dialect for the server commands and task execution.
    pub platform: HostPlatform,

    /// Output prefix template.
    pub prefix: String,

    /// Sibling termination policy.
    pub kill_others: KillOthers,

    /// Restarts for a failing task.
    pub restart_tries: u32,

    /// Delay before a restart.
    pub restart_delay: Duration,

    /// Tag on console status lines.
    pub tag: String,

    /// Colored console output.
    pub color: bool,

    /// Emit a JSON summary at the end.
    pub json: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            out_dir: "dist".to_string(),
            client_dir: "client".to_string(),
            client_command: "pnpm run build:client".to_string(),
            server: ServerBuildPlan::default(),
            platform: HostPlatform::detect(),
            prefix: "build-{name}".to_string(),
            kill_others: KillOthers::ON_FAILURE,
            restart_tries: 1,
            restart_delay: Duration::ZERO,
            tag: "buildrun".to_string(),
            color: true,
            json: false,
        }
    }
}

impl BuildConfig {
    /// Validate arguments and resolve the project root.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let root = resolve_root(&cli.root)?;

        let platform = match cli.platform.as_deref() {
            Some(name) => name.parse::<HostPlatform>()?,
            None => HostPlatform::detect(),
        };

        let targets = if cli.targets.is_empty() {
            Target::defaults()
        } else {
            cli.targets
                .iter()
                .map(|t| t.parse())
                .collect::<Result<Vec<Target>, CoreError>>()?
        };

        let kill_others = cli
            .kill_others
            .parse::<KillOthers>()
            .map_err(ConfigError::KillOthers)?;

        let server = ServerBuildPlan::default()
            .with_server_dir(cli.server_dir)
            .with_binary_name(cli.binary_name)
            .with_toolchain(cli.toolchain)
            .with_targets(targets);
        server.validate()?;

        Ok(Self {
            root,
            out_dir: cli.out_dir,
            client_dir: cli.client_dir,
            client_command: cli.client_command,
            server,
            platform,
            prefix: cli.prefix,
            kill_others,
            restart_tries: cli.restart_tries,
            restart_delay: Duration::from_millis(cli.restart_delay_ms),
            tag: cli.tag,
            color: !cli.no_color,
            json: cli.json,
        })
    }

    /// Runner options derived from this configuration.
    pub fn run_options(&self) -> RunOptions {
        RunOptions::default()
            .with_prefix(self.prefix.clone())
            .with_kill_others(self.kill_others)
            .with_restart_tries(self.restart_tries)
            .with_restart_delay(self.restart_delay)
            .with_cwd(self.root.clone())
            .with_shell(self.platform.shell())
    }
}

/// Absolute form of `path`, which must be an existing directory.
///
/// Not canonicalized: on windows that yields a `\\?\` path, which `cmd.exe`
/// rejects as a working directory.
fn resolve_root(path: &Path) -> Result<PathBuf, ConfigError> {
    let root_error = |source: std::io::Error| ConfigError::Root {
        path: path.to_path_buf(),
        source,
    };

    let root = std::path::absolute(path).map_err(root_error)?;
    let meta = std::fs::metadata(&root).map_err(root_error)?;
    if !meta.is_dir() {
        return Err(root_error(std::io::Error::other("not a directory")));
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["buildrun"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_from_cli() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let config = BuildConfig::from_cli(parse(&[
            "--root",
            root,
            "--target",
            "linux/arm64",
            "--platform",
            "posix",
            "--restart-tries",
            "3",
            "--kill-others",
            "",
        ]))
        .unwrap();

        assert_eq!(config.root, dir.path());
        assert_eq!(config.platform, HostPlatform::Posix);
        assert_eq!(config.server.targets.len(), 1);
        assert_eq!(config.restart_tries, 3);
        assert_eq!(config.kill_others, KillOthers::NEVER);

        let options = config.run_options();
        assert_eq!(options.cwd, config.root);
        assert_eq!(options.shell.program, "sh");
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = BuildConfig::from_cli(parse(&["--root", missing.to_str().unwrap()]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Root { .. }));
    }

    #[test]
    fn test_root_is_absolute_without_verbatim_prefix() {
        let config = BuildConfig::from_cli(parse(&["--root", "."])).unwrap();

        assert!(config.root.is_absolute());
        assert_eq!(config.root, std::env::current_dir().unwrap());
        assert!(!config.root.to_string_lossy().starts_with(r"\\?\"));
        assert_eq!(config.run_options().cwd, config.root);
    }

    #[test]
    fn test_root_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("package.json");
        std::fs::write(&file, "{}").unwrap();

        let err = BuildConfig::from_cli(parse(&["--root", file.to_str().unwrap()])).unwrap_err();
        assert!(matches!(err, ConfigError::Root { .. }));
    }

    #[test]
    fn test_server_dir_must_be_relative() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();

        for server_dir in ["/opt/server", "my server"] {
            let err = BuildConfig::from_cli(parse(&["--root", root, "--server-dir", server_dir]))
                .unwrap_err();
            assert!(matches!(err, ConfigError::Core(CoreError::InvalidServerDir(..))));
        }
    }

    #[test]
    fn test_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();

        let err = BuildConfig::from_cli(parse(&["--root", root, "--target", "amiga/m68k"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Core(CoreError::UnknownTargetOs(_))));

        let err = BuildConfig::from_cli(parse(&["--root", root, "--platform", "vms"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Core(CoreError::UnknownPlatform(_))));

        let err = BuildConfig::from_cli(parse(&["--root", root, "--kill-others", "always"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::KillOthers(_)));
    }
}
