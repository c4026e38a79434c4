//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all identifiers in the Docket Stack. These prevent
//! accidental identifier confusion: you cannot pass a `JobId` where a
//! `CaseId` is expected.
//!
//! Two families exist:
//!
//! - **Opaque UUID identifiers** (`CaseId`, `OwnerId`, `JobId`) minted by
//!   the stack itself.
//! - **Registry slugs** (`DocumentTypeId`, `ForumId`, `JurisdictionId`)
//!   which name entries in the static forum and document registries.
//!   Slugs are lowercase ASCII letters, digits and `-`, at most 64
//!   characters, validated at construction and on deserialization.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

const MAX_SLUG_LEN: usize = 64;

/// Unique identifier for a dispute case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId(pub Uuid);

/// Unique identifier for the user who owns a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(pub Uuid);

/// Unique identifier for a document generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl CaseId {
    /// Generate a new random case identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl OwnerId {
    /// Generate a new random owner identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl JobId {
    /// Generate a new random job identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "case:{}", self.0)
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "owner:{}", self.0)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job:{}", self.0)
    }
}

// ── Registry slugs ──────────────────────────────────────────────────

fn validate_slug(kind: &'static str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyIdentifier { kind });
    }
    if trimmed.len() > MAX_SLUG_LEN {
        return Err(ValidationError::TooLong {
            kind,
            max: MAX_SLUG_LEN,
        });
    }
    let well_formed = trimmed
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !trimmed.starts_with('-')
        && !trimmed.ends_with('-');
    if !well_formed {
        return Err(ValidationError::InvalidSlug {
            kind,
            value: trimmed.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Identifier of a document type in the document registry (e.g. `et1-claim-form`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentTypeId(String);

/// Identifier of a forum in the forum registry (e.g. `employment-tribunal`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ForumId(String);

/// Identifier of a legal jurisdiction (e.g. `england-and-wales`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JurisdictionId(String);

impl DocumentTypeId {
    /// Create a validated document type identifier.
    pub fn new(s: impl AsRef<str>) -> Result<Self, ValidationError> {
        validate_slug("document type", s.as_ref()).map(Self)
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ForumId {
    /// Create a validated forum identifier.
    pub fn new(s: impl AsRef<str>) -> Result<Self, ValidationError> {
        validate_slug("forum identifier", s.as_ref()).map(Self)
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl JurisdictionId {
    /// Create a validated jurisdiction identifier.
    pub fn new(s: impl AsRef<str>) -> Result<Self, ValidationError> {
        validate_slug("jurisdiction identifier", s.as_ref()).map(Self)
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! slug_conversions {
    ($ty:ident) => {
        impl TryFrom<String> for $ty {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

slug_conversions!(DocumentTypeId);
slug_conversions!(ForumId);
slug_conversions!(JurisdictionId);
