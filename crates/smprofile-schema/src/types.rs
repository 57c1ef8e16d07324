//! # Type Rule Registry
//!
//! Maps the type identifiers used by profiles (`opc:Int32`, `opc:UtcTime`,
//! `opc:TimeZoneDataType`, ...) to [`TypeDescriptor`]s and decides whether a
//! payload value satisfies them.
//!
//! ## Descriptor Shapes
//!
//! - [`TypeDescriptor::Primitive`]: a scalar rule (bounded integer, number,
//!   string, boolean, timestamp, GUID).
//! - [`TypeDescriptor::ArrayOf`]: an ordered sequence whose elements all
//!   satisfy the inner descriptor.
//! - [`TypeDescriptor::Record`]: a fixed-shape object whose sub-fields name
//!   other registered types.
//!
//! Adding a composite type is a registry entry, not an engine change.
//!
//! ## Unknown Types
//!
//! Lookups return a tagged [`TypeRule`]. An unrecognized identifier yields
//! [`TypeRule::Unknown`]: the value passes, and the engine reports the
//! unknown type as a warning.
//!
//! ## Identifier Forms
//!
//! `opc:Int32`, `Int32` and `http://opcfoundation.org/UA/Int32` name the same
//! rule. Identifiers in any other namespace are matched verbatim.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use smprofile_core::{is_guid, is_iso8601_datetime, is_utc_timestamp};

/// Compact prefix for OPC UA built-in types.
pub const OPC_PREFIX: &str = "opc:";

/// IRI prefix for OPC UA built-in types.
pub const OPC_IRI_PREFIX: &str = "http://opcfoundation.org/UA/";

/// How strictly textual formats (DateTime, UtcTime, Guid) are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatPolicy {
    /// Any string satisfies DateTime and Guid; UtcTime additionally needs
    /// the `Z` suffix.
    #[default]
    Lenient,
    /// DateTime must parse as ISO 8601, UtcTime as RFC 3339 ending in `Z`,
    /// and Guid as a hyphenated UUID.
    Strict,
}

/// Scalar types understood natively by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Int16,
    Int32,
    Int64,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    String,
    DateTime,
    UtcTime,
    Guid,
}

impl PrimitiveType {
    /// Every primitive type, in registration order.
    pub const ALL: [PrimitiveType; 13] = [
        Self::Boolean,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Float,
        Self::Double,
        Self::String,
        Self::DateTime,
        Self::UtcTime,
        Self::Guid,
    ];

    /// The OPC UA type name (without prefix).
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::UtcTime => "UtcTime",
            Self::Guid => "Guid",
        }
    }

    /// Human-readable description used as the `expected` part of errors.
    pub fn expected(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Int16 => "integer (-32768 to 32767)",
            Self::Int32 => "integer (-2147483648 to 2147483647)",
            Self::Int64 => "integer (-9223372036854775808 to 9223372036854775807)",
            Self::UInt16 => "unsigned integer (0 to 65535)",
            Self::UInt32 => "unsigned integer (0 to 4294967295)",
            Self::UInt64 => "unsigned integer (0 to 18446744073709551615)",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::DateTime => "ISO 8601 datetime",
            Self::UtcTime => "ISO 8601 UTC time (ending with Z)",
            Self::Guid => "GUID/UUID",
        }
    }

    /// Inclusive bounds for the integer types; `None` for everything else.
    pub fn integer_bounds(self) -> Option<(i128, i128)> {
        match self {
            Self::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            Self::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            Self::Int64 => Some((i64::MIN.into(), i64::MAX.into())),
            Self::UInt16 => Some((0, u16::MAX.into())),
            Self::UInt32 => Some((0, u32::MAX.into())),
            Self::UInt64 => Some((0, u64::MAX.into())),
            _ => None,
        }
    }

    /// Whether `value` satisfies this type under `policy`.
    pub fn accepts(self, value: &Value, policy: FormatPolicy) -> bool {
        let strict = policy == FormatPolicy::Strict;
        match self {
            Self::Boolean => value.is_boolean(),
            Self::Float | Self::Double => value.is_number(),
            Self::String => value.is_string(),
            Self::DateTime => value
                .as_str()
                .is_some_and(|s| !strict || is_iso8601_datetime(s)),
            Self::UtcTime => value.as_str().is_some_and(|s| {
                if strict {
                    is_utc_timestamp(s)
                } else {
                    s.ends_with('Z')
                }
            }),
            Self::Guid => value.as_str().is_some_and(|s| !strict || is_guid(s)),
            Self::Int16 | Self::Int32 | Self::Int64 | Self::UInt16 | Self::UInt32 | Self::UInt64 => {
                match (self.integer_bounds(), integral_value(value)) {
                    (Some((min, max)), Some(n)) => (min..=max).contains(&n),
                    _ => false,
                }
            }
        }
    }

    /// Parse an unprefixed OPC UA type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// The integer carried by a JSON number written without fraction or exponent.
///
/// serde_json reads the literal `-0` as the float `-0.0`; it is taken as zero.
fn integral_value(value: &Value) -> Option<i128> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
        .or_else(|| {
            n.as_f64()
                .filter(|f| *f == 0.0 && f.is_sign_negative())
                .map(|_| 0)
        })
}

/// One named sub-field of a [`RecordType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    /// Key of the sub-field in the payload object.
    pub name: String,
    /// Type identifier, resolved through the same registry.
    pub type_id: String,
    /// Whether the sub-field holds a sequence of `type_id` values.
    pub is_array: bool,
}

impl RecordField {
    /// A scalar sub-field.
    pub fn new(name: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: type_id.into(),
            is_array: false,
        }
    }

    /// Mark the sub-field as a sequence.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }
}

/// A fixed-shape object type, e.g. `TimeZoneDataType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    fields: Vec<RecordField>,
}

impl RecordType {
    /// Build a record from its sub-fields, in payload-check order.
    pub fn new(fields: Vec<RecordField>) -> Self {
        Self { fields }
    }

    /// Sub-fields in declaration order.
    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    /// Whether `key` names a sub-field of this record.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.name == key)
    }

    /// Description of the expected object shape, e.g.
    /// `object with offset and daylightSavingInOffset`.
    pub fn expected(&self) -> String {
        let names: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
        match names.split_last() {
            None => "object".to_string(),
            Some((only, [])) => format!("object with {only}"),
            Some((last, rest)) => format!("object with {} and {last}", rest.join(", ")),
        }
    }
}

/// Resolved shape of a registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Primitive(PrimitiveType),
    ArrayOf(Box<TypeDescriptor>),
    Record(RecordType),
}

impl TypeDescriptor {
    /// Description used as the `expected` part of errors.
    pub fn expected(&self) -> String {
        match self {
            Self::Primitive(p) => p.expected().to_string(),
            Self::ArrayOf(inner) => format!("array of {}", inner.expected()),
            Self::Record(record) => record.expected(),
        }
    }
}

impl From<PrimitiveType> for TypeDescriptor {
    fn from(p: PrimitiveType) -> Self {
        Self::Primitive(p)
    }
}

/// Outcome of a registry lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRule<'a> {
    /// The identifier resolved to a registered descriptor.
    Known(&'a TypeDescriptor),
    /// The identifier is not registered; values pass unchecked.
    Unknown(&'a str),
}

/// Result of [`TypeRegistry::check_type`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCheck {
    /// Whether the value satisfied the type.
    pub ok: bool,
    /// Canonical description of what the type requires.
    pub expected: String,
    /// False when the identifier was not registered.
    pub known: bool,
}

/// Registry of type identifiers and their descriptors.
///
/// The registry is immutable during validation and can be shared across
/// threads alongside the [`Validator`](crate::Validator) that owns it.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    rules: HashMap<String, TypeDescriptor>,
    policy: FormatPolicy,
}

impl TypeRegistry {
    /// A registry holding the built-in primitive types and `TimeZoneDataType`.
    pub fn new(policy: FormatPolicy) -> Self {
        let mut rules: HashMap<String, TypeDescriptor> = PrimitiveType::ALL
            .into_iter()
            .map(|p| (p.name().to_string(), TypeDescriptor::Primitive(p)))
            .collect();
        rules.insert(
            "TimeZoneDataType".to_string(),
            TypeDescriptor::Record(RecordType::new(vec![
                RecordField::new("offset", "opc:Int16"),
                RecordField::new("daylightSavingInOffset", "opc:Boolean"),
            ])),
        );
        Self { rules, policy }
    }

    /// The format policy applied to textual types.
    pub fn policy(&self) -> FormatPolicy {
        self.policy
    }

    /// Register (or replace) a type. Returns the descriptor it replaced.
    pub fn register(
        &mut self,
        type_id: &str,
        descriptor: TypeDescriptor,
    ) -> Option<TypeDescriptor> {
        self.rules
            .insert(canonical_type_name(type_id).to_string(), descriptor)
    }

    /// Look up the rule for a type identifier.
    pub fn lookup<'a>(&'a self, type_id: &'a str) -> TypeRule<'a> {
        match self.rules.get(canonical_type_name(type_id)) {
            Some(descriptor) => TypeRule::Known(descriptor),
            None => TypeRule::Unknown(type_id),
        }
    }

    /// Whether the identifier resolves to a registered type.
    pub fn is_known(&self, type_id: &str) -> bool {
        matches!(self.lookup(type_id), TypeRule::Known(_))
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Decide whether `value` satisfies `type_id`, and describe the type.
    ///
    /// Records and arrays are checked in full; the engine uses the same
    /// descriptors to produce path-qualified errors instead of a single flag.
    pub fn check_type(&self, type_id: &str, value: &Value) -> TypeCheck {
        match self.lookup(type_id) {
            TypeRule::Known(descriptor) => TypeCheck {
                ok: self.accepts(descriptor, value),
                expected: descriptor.expected(),
                known: true,
            },
            TypeRule::Unknown(id) => TypeCheck {
                ok: true,
                expected: format!("any value (unrecognized type '{id}')"),
                known: false,
            },
        }
    }

    /// Whether `value` satisfies `descriptor`, recursing through records
    /// and arrays.
    pub fn accepts(&self, descriptor: &TypeDescriptor, value: &Value) -> bool {
        match descriptor {
            TypeDescriptor::Primitive(p) => p.accepts(value, self.policy),
            TypeDescriptor::ArrayOf(inner) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| self.accepts(inner, item))),
            TypeDescriptor::Record(record) => {
                let Some(object) = value.as_object() else {
                    return false;
                };
                record.fields().iter().all(|field| {
                    let Some(sub) = object.get(&field.name) else {
                        return false;
                    };
                    if field.is_array {
                        sub.as_array().is_some_and(|items| {
                            items.iter().all(|item| self.accepts_id(&field.type_id, item))
                        })
                    } else {
                        self.accepts_id(&field.type_id, sub)
                    }
                })
            }
        }
    }

    fn accepts_id(&self, type_id: &str, value: &Value) -> bool {
        match self.lookup(type_id) {
            TypeRule::Known(descriptor) => self.accepts(descriptor, value),
            TypeRule::Unknown(_) => true,
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new(FormatPolicy::default())
    }
}

/// Strip the OPC UA prefix (compact or IRI) from a type identifier.
pub fn canonical_type_name(type_id: &str) -> &str {
    let trimmed = type_id.trim();
    trimmed
        .strip_prefix(OPC_PREFIX)
        .or_else(|| trimmed.strip_prefix(OPC_IRI_PREFIX))
        .unwrap_or(trimmed)
}
