//! # smprofile CLI entry point
//!
//! Parses command-line arguments, initializes tracing, loads the validator
//! configuration, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use smprofile_cli::inspect::{run_inspect, InspectArgs};
use smprofile_cli::validate::{run_validate, ValidateArgs};
use smprofile_cli::{load_config, EXIT_OPERATIONAL_ERROR};

/// SM Profile payload validator.
///
/// Checks JSON payloads against SM Profile documents and reports every
/// missing field, type mismatch and unresolved reference with its path.
#[derive(Parser, Debug)]
#[command(name = "smprofile", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit log lines as JSON instead of human-readable text.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a YAML validator configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a JSON payload against a profile.
    Validate(ValidateArgs),

    /// Print the normalized field table of a profile.
    Inspect(InspectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Logs go to stderr so stdout stays parseable with --format json.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "smprofile starting");

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Validate(args) => run_validate(args, config),
        Commands::Inspect(args) => run_inspect(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_OPERATIONAL_ERROR)
        }
    }
}
