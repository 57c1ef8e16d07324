//! # Error Types
//!
//! Errors raised while preparing profiles. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.
//!
//! Validation-time findings (missing fields, type mismatches, unresolved
//! references) are data carried by the validation result and do not appear
//! here.

use thiserror::Error;

/// Error raised while building a profile model or identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// The profile document is structurally unusable.
    #[error("malformed profile '{profile}': {reason}")]
    Malformed {
        /// Profile identifier, or `<anonymous>` when the document has none.
        profile: String,
        /// What made the document unusable.
        reason: String,
    },

    /// A profile identifier was empty after normalization.
    #[error("invalid profile identifier: {0:?}")]
    InvalidIdentifier(String),
}

impl ProfileError {
    /// Shorthand for a [`ProfileError::Malformed`] error.
    pub fn malformed(profile: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            profile: profile.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display() {
        let err = ProfileError::malformed("urn:test", "attribute 2 lacks a name");
        assert_eq!(
            err.to_string(),
            "malformed profile 'urn:test': attribute 2 lacks a name"
        );
    }

    #[test]
    fn test_invalid_identifier_display() {
        let err = ProfileError::InvalidIdentifier("  ".to_string());
        assert!(err.to_string().contains("invalid profile identifier"));
    }
}
