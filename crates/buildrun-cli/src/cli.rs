//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Build the client bundle and cross-compile the server in parallel,
/// then collect both into one output directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "buildrun", version, about, long_about = None)]
pub struct Cli {
    /// Project root containing the client and server directories
    #[arg(long, env = "BUILDRUN_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Output directory, relative to the root
    #[arg(long, default_value = "dist")]
    pub out_dir: String,

    /// Client directory, relative to the root
    #[arg(long, default_value = "client")]
    pub client_dir: String,

    /// Server directory, relative to the root
    #[arg(long, default_value = "server")]
    pub server_dir: String,

    /// Command that bundles the client
    #[arg(long, env = "BUILDRUN_CLIENT_COMMAND", default_value = "pnpm run build:client")]
    pub client_command: String,

    /// Base name of the server binaries
    #[arg(long, default_value = "FChat")]
    pub binary_name: String,

    /// Server toolchain invocation, followed by `-o <path>`
    #[arg(long, env = "BUILDRUN_TOOLCHAIN", default_value = "go build")]
    pub toolchain: String,

    /// Server target as os/arch (repeatable; defaults to linux, darwin and windows on amd64)
    #[arg(long = "target", value_name = "OS/ARCH")]
    pub targets: Vec<String>,

    /// Shell dialect override (windows or posix); detected from the host by default
    #[arg(long)]
    pub platform: Option<String>,

    /// Output prefix template ({name}, {index}, {command})
    #[arg(long, default_value = "build-{name}")]
    pub prefix: String,

    /// Kill the other tasks on: failure, success, or both (comma separated; empty for never)
    #[arg(long, default_value = "failure")]
    pub kill_others: String,

    /// Restarts for a failing task
    #[arg(long, default_value = "1")]
    pub restart_tries: u32,

    /// Delay before a restart, in milliseconds
    #[arg(long, default_value = "0")]
    pub restart_delay_ms: u64,

    /// Tag shown on status lines
    #[arg(long, default_value = "buildrun")]
    pub tag: String,

    /// Disable colored status lines
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    /// Print a JSON summary line when finished
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["buildrun"]).unwrap();
        assert_eq!(cli.client_command, "pnpm run build:client");
        assert_eq!(cli.prefix, "build-{name}");
        assert_eq!(cli.kill_others, "failure");
        assert_eq!(cli.restart_tries, 1);
        assert!(cli.targets.is_empty());
    }

    #[test]
    fn test_repeated_targets() {
        let cli = Cli::try_parse_from([
            "buildrun",
            "--target",
            "linux/arm64",
            "--target",
            "darwin/arm64",
            "--platform",
            "windows",
        ])
        .unwrap();
        assert_eq!(cli.targets, vec!["linux/arm64", "darwin/arm64"]);
        assert_eq!(cli.platform.as_deref(), Some("windows"));
    }

    #[test]
    fn test_verify_command() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
