//! # Validator Configuration
//!
//! Policy knobs for the validation engine, loadable from YAML:
//!
//! ```yaml
//! format_policy: strict
//! warn_unknown_fields: true
//! warn_unknown_types: false
//! check_namespace: true
//! max_reference_depth: 16
//! record_types:
//!   "ex:Point":
//!     - { name: x, type: opc:Double }
//!     - { name: y, type: opc:Double }
//!   "ex:Trace":
//!     - { name: points, type: "ex:Point", array: true }
//! ```
//!
//! Every key is optional; omitted keys take the defaults of
//! [`ValidatorConfig::default`].

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{FormatPolicy, RecordField, RecordType, TypeDescriptor, TypeRegistry, TypeRule};

/// Error loading or applying a validator configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config '{path}': {source}")]
    Io {
        /// Path to the configuration file.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid YAML for this schema.
    #[error("invalid config: {0}")]
    Parse(String),

    /// The configuration parsed but violates a constraint.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// One sub-field of a configured record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordFieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default)]
    pub array: bool,
}

/// Engine policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// How strictly DateTime, UtcTime and Guid strings are checked.
    pub format_policy: FormatPolicy,
    /// Warn about payload keys the profile does not declare.
    pub warn_unknown_fields: bool,
    /// Warn when a field declares an unregistered type.
    pub warn_unknown_types: bool,
    /// Warn when a payload `$namespace` differs from the profile id.
    pub check_namespace: bool,
    /// Maximum nesting of profile references in one payload.
    pub max_reference_depth: usize,
    /// Additional record types, keyed by type identifier.
    pub record_types: BTreeMap<String, Vec<RecordFieldConfig>>,
}

impl ValidatorConfig {
    pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 32;

    /// Parse a configuration from YAML text and check its constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for YAML or schema errors (including
    /// unknown keys) and [`ConfigError::Invalid`] for constraint violations.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes to `null`; treat it as all defaults.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Read and parse a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_yaml_str`](Self::from_yaml_str).
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Check value constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero reference depth, an empty
    /// record type, or a record type with repeated sub-field names.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.max_reference_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_reference_depth must be at least 1".to_string(),
            ));
        }
        for (type_id, fields) in &self.record_types {
            if fields.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "record type '{type_id}' declares no fields"
                )));
            }
            let mut seen = HashSet::new();
            for field in fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "record type '{type_id}' repeats field '{}'",
                        field.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Build the type registry: built-ins plus configured record types.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails
    /// [`check`](Self::check) or a record sub-field names a type that is
    /// neither built in nor configured.
    pub fn build_registry(&self) -> Result<TypeRegistry, ConfigError> {
        self.check()?;
        let mut registry = TypeRegistry::new(self.format_policy);
        for (type_id, fields) in &self.record_types {
            let record = RecordType::new(
                fields
                    .iter()
                    .map(|f| RecordField {
                        name: f.name.clone(),
                        type_id: f.type_id.clone(),
                        is_array: f.array,
                    })
                    .collect(),
            );
            if registry
                .register(type_id, TypeDescriptor::Record(record))
                .is_some()
            {
                tracing::debug!(type_id = %type_id, "configured record type replaces a built-in");
            }
        }

        // Sub-field types may reference each other, so resolve after all
        // records are registered.
        for (type_id, fields) in &self.record_types {
            for field in fields {
                if let TypeRule::Unknown(unknown) = registry.lookup(&field.type_id) {
                    return Err(ConfigError::Invalid(format!(
                        "record type '{type_id}' field '{}' uses unknown type '{unknown}'",
                        field.name
                    )));
                }
            }
        }

        tracing::debug!(
            types = registry.len(),
            policy = ?self.format_policy,
            "built type registry"
        );
        Ok(registry)
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            format_policy: FormatPolicy::Lenient,
            warn_unknown_fields: true,
            warn_unknown_types: true,
            check_namespace: true,
            max_reference_depth: Self::DEFAULT_MAX_REFERENCE_DEPTH,
            record_types: BTreeMap::new(),
        }
    }
}
