//! buildrun - parallel client/server build.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use buildrun::cli::Cli;
use buildrun::json_output::JsonEvent;
use buildrun::{BuildConfig, Console, Pipeline};

/// Exit code for invalid arguments.
const EXIT_CONFIG: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; progress for humans goes through the console.
    let filter = if cli.verbose {
        EnvFilter::new("warn,buildrun=debug,buildrun_runner=debug,buildrun_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let json = cli.json;
    let console = Arc::new(Console::stdout(cli.tag.clone(), !cli.no_color));

    let config = match BuildConfig::from_cli(cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            console.error(&e);
            if json {
                JsonEvent::config_invalid(&e).emit();
            }
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    info!(
        root = %config.root.display(),
        platform = %config.platform,
        "Starting buildrun"
    );

    // Tasks run in their own process groups and miss the terminal's SIGINT.
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping builds");
                shutdown.cancel();
            }
        });
    }

    let pipeline = Pipeline::new(config).with_shutdown(shutdown);
    match pipeline.run(console.clone()).await {
        Ok(report) => {
            info!(elapsed_ms = report.elapsed_ms, "Build pipeline finished");
            if json {
                JsonEvent::finished(&report).emit();
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Build pipeline failed");
            console.error(&e);
            if json {
                JsonEvent::failed(&e).emit();
            }
            ExitCode::from(e.exit_code())
        }
    }
}
