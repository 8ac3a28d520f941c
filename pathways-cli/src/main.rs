//! pathways: release tooling for the Pathways content corpus
//!
//! One-shot commands run locally or from CI:
//! - `validate`: structural checks for knowledge blocks, questionnaires and category indexes
//! - `checksum`: digest the content tree and merge the result into the manifest
//! - `bump`: compute the next `YYYY.MM.DD.PATCH` release version
//! - `verify`: compare the content tree against the manifest
//!
//! Reports go to stdout, logs to stderr.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser};
use pathways_core::Config;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "pathways", version)]
#[command(about = "Validate, checksum and version the Pathways content corpus")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "PATHWAYS_CONFIG", default_value = "pathways.toml", global = true)]
    config: PathBuf,

    /// Content root (overrides config file)
    #[arg(long, env = "PATHWAYS_CONTENT_ROOT", global = true)]
    root: Option<PathBuf>,

    /// Print machine-readable JSON reports
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let directive = match verbose {
        0 => "pathways=warn",
        1 => "pathways=info",
        _ => "pathways=debug",
    };
    // RUST_LOG takes precedence over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = load_config(&cli)?;
    debug!(
        root = %config.content.root.display(),
        manifest = %config.manifest_path().display(),
        "Configuration loaded"
    );
    commands::execute(&config, cli.command, cli.json)
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    if let Some(root) = &cli.root {
        config.content.root = root.clone();
    }
    Ok(config)
}
