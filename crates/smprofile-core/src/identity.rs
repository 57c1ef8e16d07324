//! # Profile Identifiers
//!
//! Newtype wrapper for profile namespaces. Profiles name each other through
//! `cesmii:profileReference` entries, and payloads may carry a `$namespace`
//! key; both are compared through [`ProfileId`] so that cosmetic differences
//! such as a trailing slash do not break resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProfileError;

/// Normalized identifier of a profile (its namespace IRI).
///
/// Normalization trims surrounding whitespace and removes trailing `/` and
/// `#` characters. Equality and hashing operate on the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileId(String);

impl ProfileId {
    /// Create a profile identifier, normalizing the input.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidIdentifier`] if nothing remains after
    /// normalization.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ProfileError> {
        let raw = raw.as_ref();
        let trimmed = raw.trim();
        let normalized = trimmed.trim_end_matches(['/', '#']);
        if normalized.is_empty() {
            return Err(ProfileError::InvalidIdentifier(raw.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }

    /// The normalized identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the identifier, useful as a short display name
    /// (e.g. `FeedIngredientV1` for `https://example.org/smprofiles/FeedIngredientV1`).
    pub fn short_name(&self) -> &str {
        self.0
            .rsplit(['/', '#', ':'])
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProfileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProfileId {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProfileId {
    type Error = ProfileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProfileId> for String {
    fn from(id: ProfileId) -> Self {
        id.0
    }
}

/// Returns true if `s` is a hyphenated GUID (`8-4-4-4-12` hex digits).
///
/// Braced, URN, and unhyphenated forms are rejected; producers emit the
/// hyphenated form only.
pub fn is_guid(s: &str) -> bool {
    s.len() == 36 && Uuid::parse_str(s).is_ok()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Normalizing an already-normalized identifier is a no-op.
        #[test]
        fn normalization_is_idempotent(raw in "[ ]{0,2}[a-z]{1,8}:(//)?[a-zA-Z0-9/._-]{0,30}[/#]?[ ]{0,2}") {
            let once = ProfileId::new(&raw).unwrap();
            let twice = ProfileId::new(once.as_str()).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
