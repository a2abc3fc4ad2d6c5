//! Semantic versioning for capabilities.

use crate::error::CapabilityError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic version triple.
///
/// Ordering is lexicographic on (major, minor, patch).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct SemanticVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemanticVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether this version satisfies a required version.
    ///
    /// Compatible iff the major versions match and this version is at or
    /// above the required one (same major line, at or above the minimum).
    pub fn is_compatible_with(&self, required: &SemanticVersion) -> bool {
        self.major == required.major && self >= required
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = CapabilityError;

    /// Parse from `"major.minor.patch"` — exactly three non-negative
    /// integer segments.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(CapabilityError::InvalidVersionFormat(s.to_string()));
        }
        let parse = |segment: &str| {
            segment
                .parse::<u32>()
                .map_err(|_| CapabilityError::InvalidVersionFormat(s.to_string()))
        };
        Ok(Self {
            major: parse(parts[0])?,
            minor: parse(parts[1])?,
            patch: parse(parts[2])?,
        })
    }
}

impl TryFrom<String> for SemanticVersion {
    type Error = CapabilityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SemanticVersion> for String {
    fn from(v: SemanticVersion) -> Self {
        v.to_string()
    }
}
