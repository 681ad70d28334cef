//! Argument parsing, logging setup and command dispatch for `walfetch`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::warn;
use walfetch_config::{ConfigLoader, RetrieveConfig};
use walfetch_core::{Cleanup, RetrievalService, ShellExecutor, StdoutTarget};
use walfetch_telemetry::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, Metrics, build_sha, init_logging,
};

use crate::commands::cleanup::handle_cleanup;
use crate::commands::retrieve::{handle_expand, handle_retrieve};
use crate::error::{CliError, CliResult};

/// Parses CLI arguments, executes the requested command and returns the
/// process exit code.
#[must_use]
pub fn run() -> i32 {
    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();
    match execute(cli, &mut stdout) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn execute(cli: Cli, out: &mut dyn Write) -> CliResult<()> {
    init_logging(&LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.into(),
        build_sha: build_sha(),
    })
    .context("failed to initialise logging")
    .map_err(CliError::failure)?;

    let metrics = if cli.print_metrics {
        Some(
            Metrics::new()
                .context("failed to create metrics registry")
                .map_err(CliError::failure)?,
        )
    } else {
        None
    };

    let result = dispatch(cli.command, cli.config.as_deref(), metrics.as_ref(), out);

    if let Some(metrics) = &metrics {
        match metrics.render() {
            Ok(text) => eprint!("{text}"),
            Err(err) => warn!(error = %err, "failed to render metrics"),
        }
    }
    result
}

fn dispatch(
    command: Command,
    config: Option<&Path>,
    metrics: Option<&Metrics>,
    out: &mut dyn Write,
) -> CliResult<()> {
    match command {
        Command::Retrieve(args) => {
            let service = build_service(load_config(config)?, metrics);
            handle_retrieve(&service, &args.segment, out)
        }
        Command::Expand(args) => {
            let service = build_service(load_config(config)?, metrics);
            handle_expand(&service, &args.segment, out)
        }
        Command::Cleanup(args) => {
            let cleanup = metrics.map_or_else(Cleanup::new, |metrics| {
                Cleanup::new().with_metrics(metrics.clone())
            });
            handle_cleanup(&cleanup, &args.path, args.staged, out)
        }
    }
}

fn load_config(path: Option<&Path>) -> CliResult<RetrieveConfig> {
    let loader = match path {
        Some(path) => ConfigLoader::from_path(path).map_err(config_error)?,
        None => ConfigLoader::new(),
    };
    loader
        .apply_env()
        .and_then(ConfigLoader::finish)
        .map_err(config_error)
}

/// Stdout carries only command output, so the interpreter writes to stderr.
fn build_service(config: RetrieveConfig, metrics: Option<&Metrics>) -> RetrievalService {
    let executor = ShellExecutor::new().with_stdout(StdoutTarget::Stderr);
    let service = RetrievalService::new(config, Arc::new(executor));
    match metrics {
        Some(metrics) => service.with_metrics(metrics.clone()),
        None => service,
    }
}

fn config_error(err: walfetch_config::ConfigError) -> CliError {
    let err = anyhow::Error::new(err).context("invalid configuration");
    CliError::validation(format!("{err:#}"))
}

#[derive(Parser)]
#[command(
    name = "walfetch",
    version,
    about = "Fetch missing WAL segments through a configured retrieve command"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "WALFETCH_CONFIG",
        help = "YAML or JSON configuration document"
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "WALFETCH_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL
    )]
    log_level: String,
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Pretty)]
    log_format: LogFormatArg,
    #[arg(
        long,
        global = true,
        help = "Write Prometheus metrics to stderr after the command finishes"
    )]
    print_metrics: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the retrieve command and print the staged path.
    Retrieve(SegmentArgs),
    /// Print the expanded retrieve command without running it.
    Expand(SegmentArgs),
    /// Remove a staged segment copy.
    Cleanup(CleanupArgs),
}

#[derive(Args)]
struct SegmentArgs {
    /// Segment file name, e.g. 000000010000000000000001.
    segment: String,
}

#[derive(Args)]
struct CleanupArgs {
    /// Path of the staged copy.
    path: PathBuf,
    /// Whether the copy is currently staged; without it nothing is removed.
    #[arg(long)]
    staged: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}
