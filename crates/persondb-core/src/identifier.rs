//! # External Identifier
//!
//! The handle a reconciliation host persists for a managed person:
//! `/person/<person_id>`.
//!
//! The textual form is a stable contract. Raw strings are parsed into
//! [`ExternalId`] as soon as they cross the boundary and are never passed
//! further down.

use crate::primitives::{IDENTIFIER_SEPARATOR, RESOURCE_KIND};
use crate::{PersonError, PersonId};
use std::fmt;
use std::str::FromStr;

/// Parsed form of `/person/<person_id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalId {
    person_id: PersonId,
}

impl ExternalId {
    /// Build the identifier for a person id.
    #[must_use]
    pub fn for_person(person_id: PersonId) -> Self {
        Self { person_id }
    }

    /// Parse a raw identifier.
    ///
    /// Exactly three `/`-separated parts are accepted: an empty leading part,
    /// the literal `person`, and a non-empty id.
    pub fn parse(raw: &str) -> Result<Self, PersonError> {
        let parts: Vec<&str> = raw.split(IDENTIFIER_SEPARATOR).collect();
        match parts.as_slice() {
            ["", kind, id] if *kind == RESOURCE_KIND && !id.is_empty() => Ok(Self {
                person_id: PersonId::new(*id),
            }),
            _ => Err(PersonError::InvalidIdentifier(raw.to_owned())),
        }
    }

    /// The person id this identifier points at.
    #[must_use]
    pub fn person_id(&self) -> &PersonId {
        &self.person_id
    }

    /// Consume the identifier and return the person id.
    #[must_use]
    pub fn into_person_id(self) -> PersonId {
        self.person_id
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{sep}{RESOURCE_KIND}{sep}{}",
            self.person_id,
            sep = IDENTIFIER_SEPARATOR
        )
    }
}

impl FromStr for ExternalId {
    type Err = PersonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
