//! # Inspect Subcommand
//!
//! Prints the normalized field table of a profile document: each field's
//! name, resolved type or profile reference, array flag, required flag, and
//! the rule the validator will apply to it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Value};

use smprofile_schema::{
    FieldDefinition, ProfileKind, ProfileModel, TypeRegistry, TypeRule, ValidatorConfig,
};

use crate::{load_profile, OutputFormat, EXIT_VALID};

/// Arguments for the `smprofile inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Profile document to inspect.
    #[arg(value_name = "PROFILE")]
    pub profile: PathBuf,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the inspect subcommand.
pub fn run_inspect(args: &InspectArgs, config: &ValidatorConfig) -> Result<u8> {
    let registry = config
        .build_registry()
        .context("invalid validator configuration")?;
    let profile = load_profile(&args.profile)?;

    let report = match args.format {
        OutputFormat::Text => render_table(&profile, &registry),
        OutputFormat::Json => serde_json::to_string_pretty(&describe_profile(&profile, &registry))
            .context("failed to serialize profile table")?,
    };
    println!("{report}");
    Ok(EXIT_VALID)
}

/// One row of the field table.
struct Row {
    name: String,
    target: String,
    array: &'static str,
    required: &'static str,
    rule: String,
}

impl Row {
    fn new(field: &FieldDefinition, registry: &TypeRegistry) -> Self {
        Self {
            name: field.name().to_string(),
            target: target(field),
            array: yes_no(field.is_array()),
            required: yes_no(field.is_required()),
            rule: rule(field, registry),
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn kind_label(kind: ProfileKind) -> &'static str {
    match kind {
        ProfileKind::ObjectType => "object type",
        ProfileKind::DataType => "data type",
    }
}

fn target(field: &FieldDefinition) -> String {
    match (field.profile_reference(), field.type_id()) {
        (Some(reference), _) => format!("-> {reference}"),
        (None, Some(type_id)) => type_id.to_string(),
        (None, None) => "-".to_string(),
    }
}

fn rule(field: &FieldDefinition, registry: &TypeRegistry) -> String {
    if let Some(reference) = field.profile_reference() {
        return format!("nested profile {}", reference.short_name());
    }
    match field.type_id().map(|type_id| registry.lookup(type_id)) {
        Some(TypeRule::Known(descriptor)) => descriptor.expected(),
        Some(TypeRule::Unknown(_)) => "unknown type (not checked)".to_string(),
        None => "-".to_string(),
    }
}

/// Aligned text table with a header line.
pub fn render_table(profile: &ProfileModel, registry: &TypeRegistry) -> String {
    let mut lines = vec![match profile.id() {
        Some(id) => format!("{} ({id})", profile.display_name()),
        None => profile.display_name().to_string(),
    }];
    lines.push(format!(
        "{}, {} field(s)",
        kind_label(profile.kind()),
        profile.len()
    ));
    if profile.is_empty() {
        return lines.join("\n");
    }

    let rows: Vec<Row> = profile
        .fields()
        .iter()
        .map(|field| Row::new(field, registry))
        .collect();
    let name_width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0).max(5);
    let target_width = rows.iter().map(|r| r.target.len()).max().unwrap_or(0).max(4);

    lines.push(String::new());
    lines.push(format!(
        "{:<name_width$}  {:<target_width$}  ARRAY  REQUIRED  RULE",
        "FIELD", "TYPE"
    ));
    for row in &rows {
        lines.push(format!(
            "{:<name_width$}  {:<target_width$}  {:<5}  {:<8}  {}",
            row.name, row.target, row.array, row.required, row.rule
        ));
    }
    lines.join("\n")
}

/// Machine-readable form of the field table.
pub fn describe_profile(profile: &ProfileModel, registry: &TypeRegistry) -> Value {
    let fields: Vec<Value> = profile
        .fields()
        .iter()
        .map(|field| {
            json!({
                "name": field.name(),
                "type": field.type_id(),
                "profile_reference": field.profile_reference().map(|id| id.as_str()),
                "is_array": field.is_array(),
                "is_required": field.is_required(),
                "rule": rule(field, registry),
            })
        })
        .collect();
    json!({
        "id": profile.id().map(|id| id.as_str()),
        "name": profile.display_name(),
        "kind": kind_label(profile.kind()),
        "fields": fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_root() -> PathBuf {
        let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        dir.pop(); // crates
        dir.pop(); // repo root
        dir
    }

    fn work_order() -> ProfileModel {
        load_profile(&repo_root().join("profiles/WorkOrderV1.jsonld")).unwrap()
    }

    #[test]
    fn table_lists_every_field_in_order() {
        let table = render_table(&work_order(), &TypeRegistry::default());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(
            lines[0],
            "WorkOrderV1 (https://example.org/smprofiles/WorkOrderV1)"
        );
        assert_eq!(lines[1], "object type, 16 field(s)");
        assert!(lines[3].starts_with("FIELD"));
        assert!(lines[4].starts_with("WorkOrderID "));
        assert!(lines[4].contains("GUID/UUID"));
        assert!(lines[19].starts_with("FeedIngredients"));
        assert!(lines[19].contains("-> https://example.org/smprofiles/FeedIngredientV1"));
        assert!(lines[19].contains("nested profile FeedIngredientV1"));
    }

    #[test]
    fn json_table_carries_flags() {
        let value = describe_profile(&work_order(), &TypeRegistry::default());
        assert_eq!(value["name"], "WorkOrderV1");
        let fields = value["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 16);
        assert_eq!(fields[2]["type"], "opc:TimeZoneDataType");
        assert_eq!(
            fields[2]["rule"],
            "object with offset and daylightSavingInOffset"
        );
        assert_eq!(fields[15]["is_array"], true);
        assert!(fields[15]["type"].is_string());
    }

    #[test]
    fn unknown_types_are_flagged() {
        let profile = ProfileModel::new(
            None,
            vec![FieldDefinition::typed("Label", "opc:LocalizedText").optional()],
        )
        .unwrap();
        let table = render_table(&profile, &TypeRegistry::default());
        let last = table.lines().last().unwrap();
        assert!(last.contains("unknown type (not checked)"));
        assert!(last.contains(" no "));
    }

    #[test]
    fn empty_profile_has_no_table() {
        let profile = ProfileModel::new(None, vec![]).unwrap();
        assert_eq!(
            render_table(&profile, &TypeRegistry::default()),
            "<anonymous>\nobject type, 0 field(s)"
        );
    }
}
