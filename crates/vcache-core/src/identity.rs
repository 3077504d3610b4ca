//! # Artifact Identity
//!
//! The `(name, version, hash)` triple that addresses a stored artifact.
//! Its canonical string form is `/name/version/hash`, which the default
//! resolver also uses as the relative storage path.
//!
//! ## Security Invariant
//!
//! Every segment is a single, non-hidden path component. A validated
//! identity can never resolve outside the store root nor into the store's
//! own scratch area.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Identity of a cached artifact.
///
/// Deserialization goes through [`ArtifactId::new`], so a deserialized
/// identity is validated like any other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawArtifactId")]
pub struct ArtifactId {
    name: String,
    version: String,
    hash: String,
}

impl ArtifactId {
    /// Build an identity, validating each segment.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        hash: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let name = name.into();
        let version = version.into();
        let hash = hash.into();
        validate_segment("name", &name)?;
        validate_segment("version", &version)?;
        validate_segment("hash", &hash)?;
        Ok(Self {
            name,
            version,
            hash,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}

/// Unvalidated wire form of [`ArtifactId`].
#[derive(Deserialize)]
struct RawArtifactId {
    name: String,
    version: String,
    hash: String,
}

impl TryFrom<RawArtifactId> for ArtifactId {
    type Error = IdentityError;

    fn try_from(raw: RawArtifactId) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.version, raw.hash)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/{}", self.name, self.version, self.hash)
    }
}

fn validate_segment(field: &'static str, value: &str) -> Result<(), IdentityError> {
    if value.is_empty() {
        return Err(IdentityError::Empty { field });
    }
    if value.starts_with('.') {
        return Err(IdentityError::LeadingDot { field });
    }
    if let Some(ch) = value.chars().find(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err(IdentityError::ForbiddenChar { field, ch });
    }
    Ok(())
}
