//! # Validation Engine
//!
//! Walks a payload against a [`ProfileModel`], applying type rules from the
//! [`TypeRegistry`] and recursing into fields that reference other profiles.
//!
//! ## Traversal Order
//!
//! Depth-first. Within one profile level, fields are visited in declaration
//! order; array elements in index order. Unknown payload keys are reported
//! after the declared fields of their level.
//!
//! ## Paths
//!
//! Root fields are reported by name (`WorkOrderNumber`), nested fields with
//! dots (`TimeZone.offset`), array elements with brackets
//! (`FeedIngredients[1].ProductNumber`). A non-object root payload is
//! reported at `$`.
//!
//! ## Failure Policy
//!
//! Validation never returns `Err` and never stops early: every finding is
//! recorded and traversal continues with the next field. A profile reference
//! that is missing from the [`ProfileSet`], or that would nest beyond
//! `max_reference_depth`, is reported once at the field path and the branch
//! is not entered.
//!
//! ## Thread Safety
//!
//! [`Validator`], [`ProfileModel`] and [`ProfileSet`] are `Send + Sync` and
//! never mutated by a validation call. Each call owns its findings.

use serde_json::{Map, Value};

use smprofile_core::ProfileId;

use crate::config::{ConfigError, ValidatorConfig};
use crate::profile::{FieldDefinition, ProfileModel, ProfileSet};
use crate::result::{ErrorKind, Findings, ValidationResult, WarningKind};
use crate::types::{TypeDescriptor, TypeRegistry, TypeRule};

/// Payload key carrying the namespace of the profile it claims to follow.
pub const NAMESPACE_KEY: &str = "$namespace";

/// Path reported for a non-object root payload.
const ROOT_PATH: &str = "$";

/// Longest string excerpt quoted in `actual` descriptions.
const MAX_EXCERPT_CHARS: usize = 40;

/// Validates payloads under one configuration.
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidatorConfig,
    registry: TypeRegistry,
}

impl Validator {
    /// Create a validator, building its type registry from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: ValidatorConfig) -> Result<Self, ConfigError> {
        let registry = config.build_registry()?;
        Ok(Self { config, registry })
    }

    /// Create a validator with a caller-built registry.
    ///
    /// The registry's own format policy is used; `config.format_policy` and
    /// `config.record_types` are ignored.
    pub fn with_registry(config: ValidatorConfig, registry: TypeRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Validate `payload` against `profile`, resolving profile references
    /// through `references`.
    pub fn validate(
        &self,
        payload: &Value,
        profile: &ProfileModel,
        references: &ProfileSet,
    ) -> ValidationResult {
        tracing::debug!(
            profile = %profile.display_name(),
            fields = profile.len(),
            references = references.len(),
            "validating payload"
        );

        let mut walk = Walk {
            validator: self,
            references,
            findings: Findings::default(),
            chain: Vec::new(),
        };
        walk.profile(payload, profile, "");
        let result = walk.findings.into_result();

        tracing::debug!(
            profile = %profile.display_name(),
            valid = result.is_valid(),
            errors = result.errors().len(),
            warnings = result.warnings().len(),
            "validation complete"
        );
        result
    }
}

impl Default for Validator {
    fn default() -> Self {
        let config = ValidatorConfig::default();
        let registry = TypeRegistry::new(config.format_policy);
        Self { config, registry }
    }
}

/// Validate with the default configuration.
pub fn validate(payload: &Value, profile: &ProfileModel, references: &ProfileSet) -> ValidationResult {
    Validator::default().validate(payload, profile, references)
}

/// What a field's values are checked against.
#[derive(Clone, Copy)]
enum Target<'a> {
    Profile(&'a ProfileModel, &'a ProfileId),
    Type(&'a str),
}

/// State of one traversal.
struct Walk<'a> {
    validator: &'a Validator,
    references: &'a ProfileSet,
    findings: Findings,
    /// Profile references entered on the current branch.
    chain: Vec<&'a ProfileId>,
}

impl<'a> Walk<'a> {
    fn profile(&mut self, value: &Value, profile: &'a ProfileModel, prefix: &str) {
        let Some(object) = value.as_object() else {
            let path = if prefix.is_empty() { ROOT_PATH } else { prefix };
            self.findings.error(
                ErrorKind::TypeMismatch,
                path,
                "Payload must be an object",
                Some("object".to_string()),
                Some(describe(value)),
            );
            return;
        };

        if self.validator.config.check_namespace {
            self.check_namespace(object, profile, prefix);
        }

        for field in profile.fields() {
            let path = join(prefix, field.name());
            match object.get(field.name()) {
                Some(value) => self.field(field, value, &path),
                None if field.is_required() => self.findings.error(
                    ErrorKind::MissingField,
                    &path,
                    "Missing required field",
                    None,
                    None,
                ),
                None => {}
            }
        }

        if self.validator.config.warn_unknown_fields {
            self.unknown_keys(object, prefix, |key| profile.contains_field(key));
        }
    }

    fn check_namespace(&mut self, object: &Map<String, Value>, profile: &ProfileModel, prefix: &str) {
        let (Some(claimed), Some(expected)) = (
            object.get(NAMESPACE_KEY).and_then(Value::as_str),
            profile.id(),
        ) else {
            return;
        };
        if claimed.trim().is_empty() {
            return;
        }
        if ProfileId::new(claimed).map_or(true, |id| &id != expected) {
            let path = if prefix.is_empty() { ROOT_PATH } else { prefix };
            self.findings.warn(
                WarningKind::NamespaceMismatch,
                path,
                format!("Payload namespace '{claimed}' doesn't match profile namespace '{expected}'"),
            );
        }
    }

    fn field(&mut self, field: &'a FieldDefinition, value: &Value, path: &str) {
        let items = if field.is_array() {
            match value.as_array() {
                Some(items) => Some(items),
                None => {
                    self.findings.error(
                        ErrorKind::ArrayShapeMismatch,
                        path,
                        "Expected array",
                        Some("array".to_string()),
                        Some(describe(value)),
                    );
                    return;
                }
            }
        } else {
            None
        };

        let Some(target) = self.target(field, path) else {
            return;
        };

        match items {
            Some(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.check(target, item, &index_path(path, index));
                }
            }
            None => self.check(target, value, path),
        }
    }

    /// Resolve what a field is checked against, recording unresolved or
    /// too-deep references.
    fn target(&mut self, field: &'a FieldDefinition, path: &str) -> Option<Target<'a>> {
        let Some(reference) = field.profile_reference() else {
            return field.type_id().map(Target::Type);
        };

        let Some(model) = self.references.get(reference) else {
            self.findings.error(
                ErrorKind::UnresolvedReference,
                path,
                format!("Referenced profile not loaded: {reference}"),
                Some(format!("profile {reference}")),
                Some("no matching referenced profile".to_string()),
            );
            return None;
        };

        let limit = self.validator.config.max_reference_depth;
        if self.chain.len() >= limit {
            let chain: Vec<&str> = self
                .chain
                .iter()
                .chain(std::iter::once(&reference))
                .map(|id| id.short_name())
                .collect();
            self.findings.error(
                ErrorKind::CyclicReference,
                path,
                format!(
                    "Profile reference depth limit ({limit}) exceeded: {}",
                    chain.join(" -> ")
                ),
                None,
                None,
            );
            return None;
        }

        Some(Target::Profile(model, reference))
    }

    fn check(&mut self, target: Target<'a>, value: &Value, path: &str) {
        match target {
            Target::Profile(model, id) => {
                self.chain.push(id);
                self.profile(value, model, path);
                self.chain.pop();
            }
            Target::Type(type_id) => self.typed(type_id, value, path),
        }
    }

    fn typed(&mut self, type_id: &str, value: &Value, path: &str) {
        match self.validator.registry.lookup(type_id) {
            TypeRule::Known(descriptor) => self.descriptor(descriptor, value, path),
            TypeRule::Unknown(unknown) => {
                if self.validator.config.warn_unknown_types {
                    self.findings.warn(
                        WarningKind::UnknownType,
                        path,
                        format!("Unknown type '{unknown}'; value accepted without checks"),
                    );
                }
            }
        }
    }

    fn descriptor(&mut self, descriptor: &TypeDescriptor, value: &Value, path: &str) {
        match descriptor {
            TypeDescriptor::Primitive(primitive) => {
                if !primitive.accepts(value, self.validator.registry.policy()) {
                    self.findings.error(
                        ErrorKind::TypeMismatch,
                        path,
                        "Invalid type",
                        Some(primitive.expected().to_string()),
                        Some(describe(value)),
                    );
                }
            }
            TypeDescriptor::ArrayOf(inner) => match value.as_array() {
                Some(items) => {
                    for (index, item) in items.iter().enumerate() {
                        self.descriptor(inner, item, &index_path(path, index));
                    }
                }
                None => self.findings.error(
                    ErrorKind::ArrayShapeMismatch,
                    path,
                    "Expected array",
                    Some(descriptor.expected()),
                    Some(describe(value)),
                ),
            },
            TypeDescriptor::Record(record) => {
                let Some(object) = value.as_object() else {
                    self.findings.error(
                        ErrorKind::TypeMismatch,
                        path,
                        "Value must be an object",
                        Some(record.expected()),
                        Some(describe(value)),
                    );
                    return;
                };

                for sub in record.fields() {
                    let sub_path = join(path, &sub.name);
                    let Some(sub_value) = object.get(&sub.name) else {
                        self.findings.error(
                            ErrorKind::MissingField,
                            &sub_path,
                            "Missing required field",
                            None,
                            None,
                        );
                        continue;
                    };
                    if !sub.is_array {
                        self.typed(&sub.type_id, sub_value, &sub_path);
                        continue;
                    }
                    match sub_value.as_array() {
                        Some(items) => {
                            for (index, item) in items.iter().enumerate() {
                                self.typed(&sub.type_id, item, &index_path(&sub_path, index));
                            }
                        }
                        None => self.findings.error(
                            ErrorKind::ArrayShapeMismatch,
                            &sub_path,
                            "Expected array",
                            Some("array".to_string()),
                            Some(describe(sub_value)),
                        ),
                    }
                }

                if self.validator.config.warn_unknown_fields {
                    self.unknown_keys(object, path, |key| record.contains(key));
                }
            }
        }
    }

    fn unknown_keys(
        &mut self,
        object: &Map<String, Value>,
        prefix: &str,
        declared: impl Fn(&str) -> bool,
    ) {
        for key in object.keys() {
            if is_metadata_key(key) || declared(key) {
                continue;
            }
            self.findings.warn(
                WarningKind::UnknownField,
                &join(prefix, key),
                "Field not declared by profile",
            );
        }
    }
}

/// Keys such as `$namespace` or `@type` describe the payload itself.
fn is_metadata_key(key: &str) -> bool {
    key.starts_with('$') || key.starts_with('@')
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn index_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

/// Short description of a value for the `actual` part of errors.
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) if n.is_f64() => format!("number {n}"),
        Value::Number(n) => format!("integer {n}"),
        Value::String(s) => {
            let mut chars = s.chars();
            let excerpt: String = chars.by_ref().take(MAX_EXCERPT_CHARS).collect();
            if chars.next().is_some() {
                format!("string \"{excerpt}...\"")
            } else {
                format!("string \"{excerpt}\"")
            }
        }
        Value::Array(items) => format!("array of {} item(s)", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}
