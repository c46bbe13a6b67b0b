mod commands;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use stageline::errors::EXIT_MISCONFIGURED;
use stageline::observability::{init_logging, LogFormat};

#[derive(Parser)]
#[command(
    name = "stageline",
    version,
    about = "Run named stages in order, forwarding each stage's changes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log output format (pretty, json)
    #[arg(long, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run stages in order against an initial state
    Run(RunArgs),
    /// Merge configuration files and validate them against a metadata schema
    Validate {
        /// Configuration files, later files take precedence
        #[arg(long = "config", required = true)]
        configs: Vec<PathBuf>,
        /// Metadata schema file
        #[arg(long)]
        meta: PathBuf,
    },
    /// List built-in stages
    Stages,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Directory for run output, created if absent
    #[arg(long)]
    run_directory: Option<PathBuf>,

    /// Stage to run; repeat to run several, in the given order
    #[arg(long = "engine")]
    engines: Vec<String>,

    /// Refuse to run if any stage name is unknown
    #[arg(long)]
    fail_fast: bool,

    /// Configuration files providing run_directory and engines_order
    #[arg(long = "config")]
    configs: Vec<PathBuf>,

    /// YAML or JSON file with the initial state
    #[arg(long)]
    initial: Option<PathBuf>,

    /// Log progress instead of drawing a progress bar
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level, cli.log_format) {
        eprintln!("Warning: logging not initialized: {e}");
    }

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(&args).await,
        Commands::Validate { configs, meta } => commands::validate::execute(&configs, &meta),
        Commands::Stages => commands::stages::execute(),
    };

    let code = result.unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        EXIT_MISCONFIGURED
    });
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
