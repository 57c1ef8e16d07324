//! # Profile Model
//!
//! Normalizes a JSON-LD profile document into an ordered lookup of
//! [`FieldDefinition`]s, and groups models into a [`ProfileSet`] for
//! reference resolution.
//!
//! ## Document Layout
//!
//! ```json
//! {
//!   "@context": { "WorkOrderNumber": { "@type": "opc:Int32" } },
//!   "@id": "https://example.org/smprofiles/WorkOrderV1",
//!   "cesmii:attributes": [
//!     { "cesmii:browseName": "WorkOrderNumber", "cesmii:isArray": false },
//!     {
//!       "cesmii:browseName": "FeedIngredients",
//!       "cesmii:isArray": true,
//!       "cesmii:dataType": {
//!         "@id": "https://example.org/smprofiles/FeedIngredientV1",
//!         "cesmii:profileReference": "https://example.org/smprofiles/FeedIngredientV1"
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Data-type profiles (`"cesmii:isDataType": true`) list `cesmii:fields`
//! keyed by `cesmii:fieldName` instead.
//!
//! A model is immutable once built and may be shared across threads.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use smprofile_core::{ProfileError, ProfileId};

const KEY_CONTEXT: &str = "@context";
const KEY_ID: &str = "@id";
const KEY_TYPE: &str = "@type";
const KEY_IS_DATA_TYPE: &str = "cesmii:isDataType";
const KEY_ATTRIBUTES: &str = "cesmii:attributes";
const KEY_FIELDS: &str = "cesmii:fields";
const KEY_BROWSE_NAME: &str = "cesmii:browseName";
const KEY_FIELD_NAME: &str = "cesmii:fieldName";
const KEY_DATA_TYPE: &str = "cesmii:dataType";
const KEY_PROFILE_REFERENCE: &str = "cesmii:profileReference";
const KEY_IS_ARRAY: &str = "cesmii:isArray";
const KEY_IS_REQUIRED: &str = "cesmii:isRequired";

/// Label used in errors for profiles without an `@id`.
const ANONYMOUS: &str = "<anonymous>";

/// One declared attribute of a profile.
///
/// Invariant: at least one of `type_id` and `profile_reference` is set.
/// Constructors enforce this; when both are set the reference wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    name: String,
    type_id: Option<String>,
    is_array: bool,
    profile_reference: Option<ProfileId>,
    required: bool,
}

impl FieldDefinition {
    /// A required scalar field checked against a registered type.
    pub fn typed(name: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: Some(type_id.into()),
            is_array: false,
            profile_reference: None,
            required: true,
        }
    }

    /// A required field whose value is validated against another profile.
    pub fn reference(name: impl Into<String>, profile: ProfileId) -> Self {
        Self {
            name: name.into(),
            type_id: None,
            is_array: false,
            profile_reference: Some(profile),
            required: true,
        }
    }

    /// Mark the field as a sequence of values.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Mark the field as optional: its absence is not an error.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> Option<&str> {
        self.type_id.as_deref()
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn profile_reference(&self) -> Option<&ProfileId> {
        self.profile_reference.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Whether a profile describes an object type or a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    ObjectType,
    DataType,
}

/// A normalized profile: identifier plus ordered field definitions.
#[derive(Debug, Clone)]
pub struct ProfileModel {
    id: Option<ProfileId>,
    name: Option<String>,
    kind: ProfileKind,
    fields: Vec<FieldDefinition>,
    index: HashMap<String, usize>,
}

impl ProfileModel {
    /// Build an object-type model from field definitions.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Malformed`] if two fields share a name.
    pub fn new(id: Option<ProfileId>, fields: Vec<FieldDefinition>) -> Result<Self, ProfileError> {
        let mut index = HashMap::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            if index.insert(field.name.clone(), position).is_some() {
                return Err(ProfileError::malformed(
                    label(id.as_ref()),
                    format!("duplicate field name '{}'", field.name),
                ));
            }
        }
        Ok(Self {
            id,
            name: None,
            kind: ProfileKind::ObjectType,
            fields,
            index,
        })
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Normalize a parsed profile document.
    ///
    /// Each entry's type comes from `cesmii:dataType.@id`, falling back to
    /// the `@type` of the matching `@context` term. A
    /// `cesmii:dataType.cesmii:profileReference` makes the field a nested
    /// profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Malformed`] if the document is not an object,
    /// the entry list is not an array, an entry lacks a name, an entry
    /// resolves neither a type nor a reference, or names repeat.
    pub fn from_document(document: &Value) -> Result<Self, ProfileError> {
        let Some(root) = document.as_object() else {
            return Err(ProfileError::malformed(
                ANONYMOUS,
                "profile document must be a JSON object",
            ));
        };

        let id = match root.get(KEY_ID) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(ProfileId::new(s)?),
            Some(_) => {
                return Err(ProfileError::malformed(ANONYMOUS, "@id must be a string"));
            }
        };
        let profile_label = label(id.as_ref());

        let is_data_type = optional_bool(root, KEY_IS_DATA_TYPE, false)
            .map_err(|reason| ProfileError::malformed(&profile_label, reason))?;
        let (kind, list_key, name_key) = if is_data_type {
            (ProfileKind::DataType, KEY_FIELDS, KEY_FIELD_NAME)
        } else {
            (ProfileKind::ObjectType, KEY_ATTRIBUTES, KEY_BROWSE_NAME)
        };

        let entries: &[Value] = match root.get(list_key) {
            None | Some(Value::Null) => &[],
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(ProfileError::malformed(
                    &profile_label,
                    format!("{list_key} must be an array"),
                ));
            }
        };

        let context = root.get(KEY_CONTEXT);
        let fields = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                parse_entry(entry, position, name_key, context)
                    .map_err(|reason| ProfileError::malformed(&profile_label, reason))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut model = Self::new(id, fields)?;
        model.kind = kind;
        model.name = root
            .get(KEY_BROWSE_NAME)
            .and_then(Value::as_str)
            .map(str::to_string);

        tracing::debug!(
            profile = %model.display_name(),
            fields = model.len(),
            "built profile model"
        );
        Ok(model)
    }

    /// Parse a profile document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Malformed`] if the text is not valid JSON or
    /// the document is malformed.
    pub fn from_json_str(text: &str) -> Result<Self, ProfileError> {
        let document: Value = serde_json::from_str(text)
            .map_err(|e| ProfileError::malformed(ANONYMOUS, format!("invalid JSON: {e}")))?;
        Self::from_document(&document)
    }

    /// The profile's namespace, if declared.
    pub fn id(&self) -> Option<&ProfileId> {
        self.id.as_ref()
    }

    /// The declared browse name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for logs and messages: browse name, else short id, else `<anonymous>`.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.id.as_ref().map(ProfileId::short_name))
            .unwrap_or(ANONYMOUS)
    }

    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.index.get(name).map(|&position| &self.fields[position])
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Profiles available for resolving `cesmii:profileReference` entries.
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    profiles: BTreeMap<ProfileId, ProfileModel>,
}

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model under its own identifier. Returns the model it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Malformed`] if the model has no `@id`.
    pub fn insert(&mut self, model: ProfileModel) -> Result<Option<ProfileModel>, ProfileError> {
        let Some(id) = model.id().cloned() else {
            return Err(ProfileError::malformed(
                model.display_name(),
                "a referenced profile needs an @id",
            ));
        };
        Ok(self.profiles.insert(id, model))
    }

    /// Add a model under an explicit identifier.
    pub fn insert_as(&mut self, id: ProfileId, model: ProfileModel) -> Option<ProfileModel> {
        self.profiles.insert(id, model)
    }

    pub fn get(&self, id: &ProfileId) -> Option<&ProfileModel> {
        self.profiles.get(id)
    }

    pub fn contains(&self, id: &ProfileId) -> bool {
        self.profiles.contains_key(id)
    }

    /// Identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &ProfileId> {
        self.profiles.keys()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn label(id: Option<&ProfileId>) -> String {
    id.map_or_else(|| ANONYMOUS.to_string(), ProfileId::to_string)
}

/// Normalize one attribute (or data-type field) entry.
fn parse_entry(
    entry: &Value,
    position: usize,
    name_key: &str,
    context: Option<&Value>,
) -> Result<FieldDefinition, String> {
    let Some(entry) = entry.as_object() else {
        return Err(format!("entry {position} is not an object"));
    };

    let name = match entry.get(name_key).and_then(Value::as_str).map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(format!("entry {position} lacks a {name_key}")),
    };

    let (declared_type, reference) = match entry.get(KEY_DATA_TYPE) {
        Some(Value::Object(data_type)) => (
            non_empty_str(data_type.get(KEY_ID)),
            non_empty_str(data_type.get(KEY_PROFILE_REFERENCE)),
        ),
        Some(Value::String(type_id)) if !type_id.trim().is_empty() => (Some(type_id.as_str()), None),
        _ => (None, None),
    };
    let type_id = declared_type.or_else(|| context_type(context, &name));

    let profile_reference = reference
        .map(ProfileId::new)
        .transpose()
        .map_err(|e| format!("field '{name}' has an invalid profile reference: {e}"))?;

    if type_id.is_none() && profile_reference.is_none() {
        return Err(format!(
            "field '{name}' declares neither a data type nor a profile reference"
        ));
    }

    let is_array = optional_bool(entry, KEY_IS_ARRAY, false)?;
    let required = optional_bool(entry, KEY_IS_REQUIRED, true)?;

    Ok(FieldDefinition {
        name,
        type_id: type_id.map(str::to_string),
        is_array,
        profile_reference,
        required,
    })
}

/// The `@type` of a `@context` term. JSON-LD allows the context to be an
/// array of objects; later entries override earlier ones.
fn context_type<'a>(context: Option<&'a Value>, term: &str) -> Option<&'a str> {
    match context? {
        Value::Object(map) => map
            .get(term)
            .and_then(|entry| non_empty_str(entry.get(KEY_TYPE))),
        Value::Array(items) => items
            .iter()
            .rev()
            .find_map(|item| context_type(Some(item), term)),
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn optional_bool(object: &Map<String, Value>, key: &str, default: bool) -> Result<bool, String> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(format!("{key} must be a boolean, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FEED: &str = "https://example.org/smprofiles/FeedIngredientV1";

    fn work_order_document() -> Value {
        json!({
            "@context": {
                "opc": "http://opcfoundation.org/UA/",
                "WorkOrderID": { "@id": "opc:WorkOrderID", "@type": "opc:Guid" },
                "WorkOrderNumber": { "@type": "opc:Int32" }
            },
            "@id": "https://example.org/smprofiles/WorkOrderV1/",
            "cesmii:browseName": "WorkOrderV1",
            "cesmii:attributes": [
                { "cesmii:browseName": "WorkOrderID", "cesmii:dataType": { "@id": "opc:Guid" } },
                { "cesmii:browseName": "WorkOrderNumber" },
                {
                    "cesmii:browseName": "FeedIngredients",
                    "cesmii:isArray": true,
                    "cesmii:dataType": { "@id": FEED, "cesmii:profileReference": FEED }
                },
                {
                    "cesmii:browseName": "Notes",
                    "cesmii:dataType": { "@id": "opc:String" },
                    "cesmii:isRequired": false
                }
            ]
        })
    }

    #[test]
    fn test_from_document_preserves_order_and_normalizes() {
        let model = ProfileModel::from_document(&work_order_document()).unwrap();
        let names: Vec<&str> = model.fields().iter().map(FieldDefinition::name).collect();
        assert_eq!(names, ["WorkOrderID", "WorkOrderNumber", "FeedIngredients", "Notes"]);
        assert_eq!(
            model.id().map(ProfileId::as_str),
            Some("https://example.org/smprofiles/WorkOrderV1")
        );
        assert_eq!(model.name(), Some("WorkOrderV1"));
        assert_eq!(model.kind(), ProfileKind::ObjectType);
    }

    #[test]
    fn test_type_falls_back_to_context() {
        let model = ProfileModel::from_document(&work_order_document()).unwrap();
        assert_eq!(model.field("WorkOrderNumber").unwrap().type_id(), Some("opc:Int32"));
        assert_eq!(model.field("WorkOrderID").unwrap().type_id(), Some("opc:Guid"));
    }

    #[test]
    fn test_reference_and_flags() {
        let model = ProfileModel::from_document(&work_order_document()).unwrap();
        let feed = model.field("FeedIngredients").unwrap();
        assert!(feed.is_array());
        assert_eq!(feed.profile_reference().map(ProfileId::as_str), Some(FEED));
        assert!(feed.is_required());
        assert!(!model.field("Notes").unwrap().is_required());
    }

    #[test]
    fn test_data_type_profile_uses_fields() {
        let doc = json!({
            "@id": "urn:example:Dimensions",
            "cesmii:isDataType": true,
            "cesmii:fields": [
                { "cesmii:fieldName": "Width", "cesmii:dataType": { "@id": "opc:Double" } },
                { "cesmii:fieldName": "Height", "cesmii:dataType": "opc:Double" }
            ]
        });
        let model = ProfileModel::from_document(&doc).unwrap();
        assert_eq!(model.kind(), ProfileKind::DataType);
        assert_eq!(model.len(), 2);
        assert_eq!(model.field("Height").unwrap().type_id(), Some("opc:Double"));
    }

    #[test]
    fn test_context_array_later_entries_win() {
        let doc = json!({
            "@context": [
                { "Count": { "@type": "opc:Int16" } },
                { "Count": { "@type": "opc:Int64" } }
            ],
            "cesmii:attributes": [{ "cesmii:browseName": "Count" }]
        });
        let model = ProfileModel::from_document(&doc).unwrap();
        assert_eq!(model.field("Count").unwrap().type_id(), Some("opc:Int64"));
        assert!(model.id().is_none());
        assert_eq!(model.display_name(), "<anonymous>");
    }

    #[test]
    fn test_missing_attributes_section_yields_empty_model() {
        let model = ProfileModel::from_document(&json!({ "@id": "urn:example:Empty" })).unwrap();
        assert!(model.is_empty());
        assert_eq!(model.display_name(), "Empty");
    }

    // ---- malformed documents ----

    fn malformed_reason(doc: Value) -> String {
        match ProfileModel::from_document(&doc).unwrap_err() {
            ProfileError::Malformed { reason, .. } => reason,
            other => panic!("Expected Malformed, got: {other}"),
        }
    }

    #[test]
    fn test_non_object_document_rejected() {
        assert!(malformed_reason(json!(["not", "a", "profile"])).contains("JSON object"));
    }

    #[test]
    fn test_attributes_not_array_rejected() {
        let reason = malformed_reason(json!({ "cesmii:attributes": { "a": 1 } }));
        assert!(reason.contains("must be an array"));
    }

    #[test]
    fn test_entry_without_browse_name_rejected() {
        let reason = malformed_reason(json!({
            "cesmii:attributes": [{ "cesmii:dataType": { "@id": "opc:String" } }]
        }));
        assert!(reason.contains("entry 0 lacks a cesmii:browseName"), "{reason}");
    }

    #[test]
    fn test_entry_without_type_or_reference_rejected() {
        let reason = malformed_reason(json!({
            "cesmii:attributes": [{ "cesmii:browseName": "Mystery" }]
        }));
        assert!(reason.contains("neither a data type nor a profile reference"));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let reason = malformed_reason(json!({
            "cesmii:attributes": [
                { "cesmii:browseName": "A", "cesmii:dataType": "opc:String" },
                { "cesmii:browseName": "A", "cesmii:dataType": "opc:Int32" }
            ]
        }));
        assert!(reason.contains("duplicate field name 'A'"));
    }

    #[test]
    fn test_non_boolean_flag_rejected() {
        let reason = malformed_reason(json!({
            "cesmii:attributes": [
                { "cesmii:browseName": "A", "cesmii:dataType": "opc:String", "cesmii:isArray": "yes" }
            ]
        }));
        assert!(reason.contains("cesmii:isArray must be a boolean"));
    }

    #[test]
    fn test_invalid_json_text_rejected() {
        assert!(matches!(
            ProfileModel::from_json_str("{ not json"),
            Err(ProfileError::Malformed { .. })
        ));
    }

    // ---- programmatic construction ----

    #[test]
    fn test_new_rejects_duplicates() {
        let fields = vec![
            FieldDefinition::typed("A", "opc:Int32"),
            FieldDefinition::typed("A", "opc:String"),
        ];
        assert!(ProfileModel::new(None, fields).is_err());
    }

    // ---- profile set ----

    #[test]
    fn test_profile_set_lookup_normalizes_ids() {
        let child = ProfileModel::new(
            Some(ProfileId::new(FEED).unwrap()),
            vec![FieldDefinition::typed("ProductNumber", "opc:Int64")],
        )
        .unwrap();
        let mut set = ProfileSet::new();
        assert!(set.insert(child).unwrap().is_none());
        assert!(set.contains(&ProfileId::new(format!("{FEED}/")).unwrap()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_profile_set_rejects_anonymous_insert() {
        let anonymous = ProfileModel::new(None, vec![]).unwrap();
        assert!(ProfileSet::new().insert(anonymous).is_err());
    }
}
