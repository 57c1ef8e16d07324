//! # Validate Subcommand
//!
//! Loads a payload, its profile and any referenced profiles, runs the
//! validation engine, and prints a text or JSON report.
//!
//! Exit codes follow the crate convention: 0 valid, 1 invalid. Unreadable
//! or malformed input is returned as `Err` and mapped to 2 by `main`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use smprofile_schema::{FormatPolicy, ProfileModel, ValidationResult, Validator, ValidatorConfig};

use crate::{load_json, load_profile, load_references, OutputFormat, EXIT_INVALID, EXIT_VALID};

/// Arguments for the `smprofile validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON payload to validate.
    #[arg(value_name = "PAYLOAD")]
    pub payload: PathBuf,

    /// Profile document the payload must conform to.
    #[arg(long, value_name = "FILE")]
    pub profile: PathBuf,

    /// Profile document referenced by the main profile. Repeatable.
    #[arg(long = "reference", value_name = "FILE")]
    pub references: Vec<PathBuf>,

    /// Check DateTime, UtcTime and Guid strings strictly, overriding the config.
    #[arg(long)]
    pub strict: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure.
pub fn run_validate(args: &ValidateArgs, mut config: ValidatorConfig) -> Result<u8> {
    if args.strict {
        config.format_policy = FormatPolicy::Strict;
    }
    let validator = Validator::new(config).context("invalid validator configuration")?;

    let profile = load_profile(&args.profile)?;
    let references = load_references(&args.references)?;
    let payload = load_json(&args.payload)?;

    let result = validator.validate(&payload, &profile, &references);
    tracing::info!(
        payload = %args.payload.display(),
        valid = result.is_valid(),
        errors = result.errors().len(),
        warnings = result.warnings().len(),
        "validated payload"
    );

    let report = match args.format {
        OutputFormat::Text => render_text(&args.payload, &profile, &result),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&result).context("failed to serialize report")?
        }
    };
    println!("{report}");

    Ok(if result.is_valid() { EXIT_VALID } else { EXIT_INVALID })
}

/// Human-readable report: a status line, then errors and warnings.
pub fn render_text(payload: &Path, profile: &ProfileModel, result: &ValidationResult) -> String {
    let mut status = format!(
        "{}: {} against {}",
        if result.is_valid() { "OK" } else { "FAIL" },
        payload.display(),
        profile.display_name()
    );
    if !result.is_valid() {
        status.push_str(&format!(" ({} error(s))", result.errors().len()));
    }

    let mut lines = vec![status];
    lines.extend(
        result
            .errors()
            .iter()
            .map(|error| format!("  ERROR [{}] {error}", error.kind)),
    );
    lines.extend(result.warnings().iter().map(|warning| format!("  WARN {warning}")));
    lines.join("\n")
}
