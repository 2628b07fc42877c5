//! # Core Type Definitions
//!
//! This module contains the types shared by every layer of persondb:
//! - The record key (`PersonId`)
//! - The persisted record (`PersonRecord`)
//! - The caller-declared desired state (`PersonSpec`)
//! - The caller-facing error taxonomy (`PersonError`)
//!
//! Storage-level errors live in [`crate::storage::StoreError`] and are
//! normalized into `PersonError` by the [`crate::StoreClient`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Primary key of a person record.
///
/// Supplied by the caller at create time and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    /// Wrap a raw id. Shape checks happen in [`crate::schema`].
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A person as persisted by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Primary key.
    pub id: PersonId,
    /// Surname. Required, 1–30 characters.
    pub last_name: String,
    /// Given name. `None` when not set.
    pub first_name: Option<String>,
}

impl PersonRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(id: PersonId, last_name: impl Into<String>, first_name: Option<String>) -> Self {
        Self {
            id,
            last_name: last_name.into(),
            first_name,
        }
    }
}

/// Desired state of a person as declared by the caller.
///
/// Unvalidated input. [`crate::schema::validate`] turns it into a
/// [`PersonRecord`] or reports which attribute is wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSpec {
    pub person_id: String,
    pub last_name: String,
    #[serde(default)]
    pub first_name: Option<String>,
}

impl PersonSpec {
    /// Create a new declared person.
    #[must_use]
    pub fn new(
        person_id: impl Into<String>,
        last_name: impl Into<String>,
        first_name: Option<&str>,
    ) -> Self {
        Self {
            person_id: person_id.into(),
            last_name: last_name.into(),
            first_name: first_name.map(str::to_owned),
        }
    }
}

impl From<&PersonRecord> for PersonSpec {
    fn from(record: &PersonRecord) -> Self {
        Self {
            person_id: record.id.as_str().to_owned(),
            last_name: record.last_name.clone(),
            first_name: record.first_name.clone(),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors surfaced to the caller of the reconciler.
///
/// - No silent failures: every kind is distinguishable
/// - No retries happen below this layer
/// - Nothing in the core panics; all errors are recoverable values
#[derive(Debug, Error)]
pub enum PersonError {
    /// The backing medium could not be opened, read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// No record exists for the requested id.
    #[error("person '{0}' not found")]
    NotFound(PersonId),

    /// Create was called for an id that is already stored.
    #[error(
        "person with person_id '{0}' already exists; import it instead of creating it"
    )]
    AlreadyExists(PersonId),

    /// The external identifier is not of the form `/person/<id>`.
    #[error("invalid ID format: expected '/person/<person_id>', got: {0}")]
    InvalidIdentifier(String),

    /// A declared attribute violates its schema. Raised before any store call.
    #[error("invalid value for {field}: {reason}")]
    ValidationFailed { field: &'static str, reason: String },

    /// An immutable attribute changed; the record must be replaced instead.
    #[error("{field} cannot be changed in place; the person must be replaced")]
    RequiresReplacement { field: &'static str },

    /// The provider configuration is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PersonError {
    /// Short machine-readable kind name, stable across releases.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::RequiresReplacement { .. } => "requires_replacement",
            Self::Configuration(_) => "configuration",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
