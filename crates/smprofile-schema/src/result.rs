//! # Validation Result
//!
//! Findings of one validation pass. Errors and warnings are plain data,
//! collected in depth-first traversal order and handed to the caller in an
//! immutable [`ValidationResult`].

use std::fmt;

use serde::Serialize;

/// Category of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required field is absent from the payload.
    MissingField,
    /// A value's shape or range disagrees with its declared type.
    TypeMismatch,
    /// An array was declared but a non-sequence value was found.
    ArrayShapeMismatch,
    /// A profile reference has no entry in the referenced-profile set.
    UnresolvedReference,
    /// A profile reference chain exceeded the configured depth limit.
    CyclicReference,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingField => "missing_field",
            Self::TypeMismatch => "type_mismatch",
            Self::ArrayShapeMismatch => "array_shape_mismatch",
            Self::UnresolvedReference => "unresolved_reference",
            Self::CyclicReference => "cyclic_reference",
        })
    }
}

/// A single path-qualified rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Location in the payload, e.g. `FeedIngredients[0].ProductNumber`.
    pub path: String,
    pub kind: ErrorKind,
    pub message: String,
    /// Description of the required shape, type, or range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Description of what was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let (Some(expected), Some(actual)) = (&self.expected, &self.actual) {
            write!(f, " (expected: {expected}, got: {actual})")?;
        }
        Ok(())
    }
}

/// Category of a non-fatal observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The payload carries a key the profile does not declare.
    UnknownField,
    /// A field declares a type identifier the registry does not know.
    UnknownType,
    /// The payload's `$namespace` differs from the profile identifier.
    NamespaceMismatch,
}

/// A non-fatal observation. Warnings never affect validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    pub path: String,
    pub kind: WarningKind,
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Outcome of validating one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Assemble a result; validity is derived from the error list.
    pub fn new(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// True iff no errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Errors in depth-first traversal order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Warnings in traversal order.
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// Errors recorded at exactly `path`.
    pub fn errors_at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ValidationError> + 'a {
        self.errors.iter().filter(move |e| e.path == path)
    }

    /// Errors of the given kind.
    pub fn errors_of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationError> + '_ {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// Consumes self and returns the error and warning lists.
    pub fn into_parts(self) -> (Vec<ValidationError>, Vec<ValidationWarning>) {
        (self.errors, self.warnings)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return f.write_str("Valid");
        }
        write!(f, "Invalid: {} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

/// Accumulates findings during one traversal.
#[derive(Debug, Default)]
pub(crate) struct Findings {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
}

impl Findings {
    pub(crate) fn error(
        &mut self,
        kind: ErrorKind,
        path: &str,
        message: impl Into<String>,
        expected: Option<String>,
        actual: Option<String>,
    ) {
        self.errors.push(ValidationError {
            path: path.to_string(),
            kind,
            message: message.into(),
            expected,
            actual,
        });
    }

    pub(crate) fn warn(&mut self, kind: WarningKind, path: &str, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.to_string(),
            kind,
            message: message.into(),
        });
    }

    pub(crate) fn into_result(self) -> ValidationResult {
        ValidationResult::new(self.errors, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_mismatch(path: &str) -> ValidationError {
        ValidationError {
            path: path.to_string(),
            kind: ErrorKind::TypeMismatch,
            message: "Invalid type".to_string(),
            expected: Some("integer (-2147483648 to 2147483647)".to_string()),
            actual: Some("string \"x\"".to_string()),
        }
    }

    #[test]
    fn test_validity_derives_from_errors() {
        assert!(ValidationResult::new(vec![], vec![]).is_valid());
        assert!(!ValidationResult::new(vec![type_mismatch("A")], vec![]).is_valid());
    }

    #[test]
    fn test_warnings_do_not_affect_validity() {
        let warning = ValidationWarning {
            path: "Extra".to_string(),
            kind: WarningKind::UnknownField,
            message: "field not declared by profile".to_string(),
        };
        let result = ValidationResult::new(vec![], vec![warning]);
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn test_error_display_with_expected_and_actual() {
        let display = type_mismatch("WorkOrderNumber").to_string();
        assert_eq!(
            display,
            "WorkOrderNumber: Invalid type (expected: integer (-2147483648 to 2147483647), got: string \"x\")"
        );
    }

    #[test]
    fn test_error_display_without_details() {
        let error = ValidationError {
            path: "TimeZone.offset".to_string(),
            kind: ErrorKind::MissingField,
            message: "Missing required field".to_string(),
            expected: None,
            actual: None,
        };
        assert_eq!(error.to_string(), "TimeZone.offset: Missing required field");
    }

    #[test]
    fn test_result_display() {
        assert_eq!(ValidationResult::new(vec![], vec![]).to_string(), "Valid");
        let invalid = ValidationResult::new(vec![type_mismatch("A"), type_mismatch("B")], vec![]);
        let display = invalid.to_string();
        assert!(display.starts_with("Invalid: 2 error(s)"));
        assert!(display.contains("\n  - A: Invalid type"));
        assert!(display.contains("\n  - B: Invalid type"));
    }

    #[test]
    fn test_errors_at_and_of_kind() {
        let result = ValidationResult::new(
            vec![type_mismatch("A"), type_mismatch("B"), type_mismatch("A")],
            vec![],
        );
        assert_eq!(result.errors_at("A").count(), 2);
        assert_eq!(result.errors_at("C").count(), 0);
        assert_eq!(result.errors_of_kind(ErrorKind::TypeMismatch).count(), 3);
        assert_eq!(result.errors_of_kind(ErrorKind::MissingField).count(), 0);
    }

    #[test]
    fn test_serializes_kinds_in_snake_case() {
        let result = ValidationResult::new(vec![type_mismatch("A")], vec![]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["errors"][0]["kind"], "type_mismatch");
        assert_eq!(json["errors"][0]["path"], "A");
        assert!(json["warnings"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_findings_preserve_order() {
        let mut findings = Findings::default();
        findings.error(ErrorKind::MissingField, "First", "Missing required field", None, None);
        findings.warn(WarningKind::UnknownField, "Extra", "field not declared by profile");
        findings.error(ErrorKind::TypeMismatch, "Second", "Invalid type", None, None);
        let result = findings.into_result();
        let paths: Vec<&str> = result.errors().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["First", "Second"]);
        assert!(!result.is_valid());
    }
}
