//! # smprofile-cli: Command-Line Front End
//!
//! Provides the `smprofile` binary on top of `smprofile-schema`.
//!
//! ## Subcommands
//!
//! - `smprofile validate`: Validate a payload against a profile.
//! - `smprofile inspect`: Print a profile's normalized field table.
//!
//! ```bash
//! smprofile validate order.json --profile WorkOrderV1.jsonld \
//!     --reference FeedIngredientV1.jsonld
//! smprofile --config strict.yaml validate order.json --profile WorkOrderV1.jsonld --format json
//! smprofile inspect WorkOrderV1.jsonld
//! ```
//!
//! ## Exit Codes
//!
//! `0` valid, `1` invalid, `2` operational error (unreadable or malformed
//! input, invalid configuration).
//!
//! All inputs are local files.

pub mod inspect;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde_json::Value;

use smprofile_schema::{ProfileModel, ProfileSet, ValidatorConfig};

/// Payload conforms to its profile.
pub const EXIT_VALID: u8 = 0;
/// Payload has at least one validation error.
pub const EXIT_INVALID: u8 = 1;
/// Input could not be read or parsed.
pub const EXIT_OPERATIONAL_ERROR: u8 = 2;

/// Report format on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Load the validator configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<ValidatorConfig> {
    let Some(path) = path else {
        return Ok(ValidatorConfig::default());
    };
    let config = ValidatorConfig::from_yaml_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded validator config");
    Ok(config)
}

/// Read and parse a JSON file.
pub fn load_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Read a profile document and normalize it into a [`ProfileModel`].
pub fn load_profile(path: &Path) -> Result<ProfileModel> {
    let document = load_json(path)?;
    let model = ProfileModel::from_document(&document)
        .with_context(|| format!("failed to load profile {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        profile = %model.display_name(),
        fields = model.len(),
        "loaded profile"
    );
    Ok(model)
}

/// Load referenced profiles into a [`ProfileSet`] keyed by their `@id`.
pub fn load_references<P: AsRef<Path>>(paths: &[P]) -> Result<ProfileSet> {
    let mut set = ProfileSet::new();
    for path in paths {
        let path = path.as_ref();
        let model = load_profile(path)?;
        let replaced = set
            .insert(model)
            .with_context(|| format!("referenced profile {} cannot be keyed", path.display()))?;
        if let Some(previous) = replaced {
            tracing::warn!(
                path = %path.display(),
                profile = %previous.display_name(),
                "referenced profile loaded twice; later file wins"
            );
        }
    }
    Ok(set)
}
