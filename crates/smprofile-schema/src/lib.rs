//! # smprofile-schema: Profile-Driven Payload Validation
//!
//! Validates structured payloads (messages, API bodies) against declarative
//! Smart Manufacturing profiles.
//!
//! ## Components
//!
//! - [`types`]: the type rule registry. Maps type identifiers such as
//!   `opc:Int32` or `opc:TimeZoneDataType` to descriptors and checks values.
//! - [`profile`]: normalizes a parsed JSON-LD profile document into a
//!   [`ProfileModel`]; groups referenced models in a [`ProfileSet`].
//! - [`validate`]: the recursive engine. Walks declared fields, applies type
//!   rules, recurses through profile references and arrays, and collects
//!   path-qualified findings.
//! - [`result`]: the immutable [`ValidationResult`].
//! - [`config`]: [`ValidatorConfig`] policy knobs, loadable from YAML.
//!
//! ## Usage
//!
//! ```
//! use serde_json::json;
//! use smprofile_schema::{validate, ProfileModel, ProfileSet};
//!
//! let profile = ProfileModel::from_document(&json!({
//!     "@id": "https://example.org/smprofiles/CounterV1",
//!     "cesmii:attributes": [
//!         { "cesmii:browseName": "Count", "cesmii:dataType": { "@id": "opc:UInt16" } }
//!     ]
//! }))?;
//!
//! let result = validate(&json!({ "Count": 70000 }), &profile, &ProfileSet::new());
//! assert!(!result.is_valid());
//! assert_eq!(result.errors()[0].path, "Count");
//! # Ok::<(), smprofile_core::ProfileError>(())
//! ```
//!
//! ## Crate Policy
//!
//! - Depends only on `smprofile-core` internally.
//! - No I/O during validation. Configuration files are the only thing this
//!   crate reads, and only on request.
//! - Validation findings are data; only profile construction and
//!   configuration loading return `Err`.

pub mod config;
pub mod profile;
pub mod result;
pub mod types;
pub mod validate;

pub use config::{ConfigError, RecordFieldConfig, ValidatorConfig};
pub use profile::{FieldDefinition, ProfileKind, ProfileModel, ProfileSet};
pub use result::{ErrorKind, ValidationError, ValidationResult, ValidationWarning, WarningKind};
pub use types::{
    FormatPolicy, PrimitiveType, RecordField, RecordType, TypeCheck, TypeDescriptor, TypeRegistry,
    TypeRule,
};
pub use validate::{validate, Validator};
