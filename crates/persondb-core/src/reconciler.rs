//! # Resource Reconciler
//!
//! Lifecycle state machine for a managed person.
//!
//! ```text
//!   Absent ──create──▶ Present ──delete──▶ Absent
//!                        │  ▲
//!                        │  └──update (first_name only)
//!                        └──read miss (drift)──▶ Absent
//! ```
//!
//! The reconciler keeps no state between calls. Each operation takes the
//! declared view it needs and returns the new [`ResourceState`]; on error the
//! caller keeps its previous state untouched.
//!
//! Create and update always finish with a read-back so the returned state is
//! exactly what the store holds.

use crate::client::{BackendKind, StoreClient};
use crate::plan::ChangePlan;
use crate::schema::{self, LAST_NAME, PERSON_ID};
use crate::{ExternalId, PersonError, PersonId, PersonRecord, PersonSpec};
use std::path::Path;

// =============================================================================
// RESOURCE STATE
// =============================================================================

/// Externally observable state of a managed person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// No identifier assigned (never created, deleted, or gone out-of-band).
    Absent,
    /// Identifier assigned and the record exists in the store.
    Present {
        identifier: ExternalId,
        person: PersonRecord,
    },
}

impl ResourceState {
    fn present(person: PersonRecord) -> Self {
        Self::Present {
            identifier: ExternalId::for_person(person.id.clone()),
            person,
        }
    }

    /// The assigned identifier, if any.
    #[must_use]
    pub fn identifier(&self) -> Option<&ExternalId> {
        match self {
            Self::Absent => None,
            Self::Present { identifier, .. } => Some(identifier),
        }
    }

    /// The attributes as last read from the store, if present.
    #[must_use]
    pub fn person(&self) -> Option<&PersonRecord> {
        match self {
            Self::Absent => None,
            Self::Present { person, .. } => Some(person),
        }
    }

    /// Whether the record still exists.
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }
}

/// Starting state produced by import: a raw identifier awaiting its first read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedState {
    identifier: String,
}

impl ImportedState {
    /// The identifier exactly as supplied by the caller.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// RECONCILER
// =============================================================================

/// Maps declared-state lifecycle operations onto the store client.
#[derive(Debug)]
pub struct Reconciler {
    client: StoreClient,
}

impl Reconciler {
    /// Create a reconciler over an existing client.
    #[must_use]
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Open the configured store and build a reconciler over it.
    ///
    /// # Errors
    ///
    /// - `Configuration` if `location` is empty for a persistent backend
    /// - `StorageUnavailable` if the table or file cannot be opened or created
    pub fn configure(location: &Path, backend: BackendKind) -> Result<Self, PersonError> {
        if backend != BackendKind::Memory && location.as_os_str().is_empty() {
            return Err(PersonError::Configuration(
                "database_filename must not be empty".to_string(),
            ));
        }
        tracing::debug!(
            "configuring {} store at {}",
            backend,
            location.display()
        );
        let client = StoreClient::open(location, backend)?;
        tracing::info!(backend = %client.backend().kind(), "person store ready");
        Ok(Self::new(client))
    }

    /// Get a reference to the store client.
    #[must_use]
    pub fn client(&self) -> &StoreClient {
        &self.client
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Create a person that does not exist yet.
    ///
    /// Existing records are never adopted: if the id is already stored the
    /// call fails with `AlreadyExists` and the caller is expected to import.
    pub fn create(&self, declared: &PersonSpec) -> Result<ResourceState, PersonError> {
        let record = schema::validate(declared)?;
        tracing::info!(person_id = %record.id, "create person");

        if self.client.check_person_exists(&record.id)? {
            return Err(PersonError::AlreadyExists(record.id));
        }
        // A racing writer can still win between the check and the insert; the
        // store reports that as AlreadyExists too.
        self.client.create_person(&record)?;

        let identifier = ExternalId::for_person(record.id);
        self.read_back(identifier)
    }

    /// Refresh the state behind a raw identifier.
    ///
    /// A missing record is drift, not an error: the result is `Absent` and
    /// the caller should drop or recreate the person.
    pub fn read(&self, identifier: &str) -> Result<ResourceState, PersonError> {
        let identifier = ExternalId::parse(identifier)?;
        self.read_id(&identifier)
    }

    /// [`Reconciler::read`] for an already parsed identifier.
    pub fn read_id(&self, identifier: &ExternalId) -> Result<ResourceState, PersonError> {
        tracing::debug!(identifier = %identifier, "read person");
        match self.client.read_person(identifier.person_id()) {
            Ok(person) => Ok(ResourceState::present(person)),
            Err(PersonError::NotFound(id)) => {
                tracing::warn!(person_id = %id, "person no longer exists, clearing identifier");
                Ok(ResourceState::Absent)
            }
            Err(e) => Err(e),
        }
    }

    /// Update the mutable attributes of a present person.
    ///
    /// `person_id` and `last_name` are immutable: a declared value that
    /// differs from the identifier or the stored record is rejected with
    /// `RequiresReplacement` before anything is written.
    pub fn update(
        &self,
        identifier: &ExternalId,
        declared: &PersonSpec,
    ) -> Result<ResourceState, PersonError> {
        let record = schema::validate(declared)?;
        tracing::info!(person_id = %record.id, "update person");

        if &record.id != identifier.person_id() {
            return Err(PersonError::RequiresReplacement {
                field: PERSON_ID.name,
            });
        }
        let current = self.client.read_person(&record.id)?;
        if current.last_name != record.last_name {
            return Err(PersonError::RequiresReplacement {
                field: LAST_NAME.name,
            });
        }

        self.client.update_person(&record)?;
        self.read_back(identifier.clone())
    }

    /// Delete a person. Deleting a missing person is an error.
    pub fn delete(&self, person_id: &PersonId) -> Result<ResourceState, PersonError> {
        tracing::info!(person_id = %person_id, "delete person");
        self.client.delete_person(person_id)?;
        Ok(ResourceState::Absent)
    }

    /// Adopt an out-of-band record. The identifier is taken verbatim; the
    /// following [`Reconciler::read`] validates it and fills the attributes.
    #[must_use]
    pub fn import(&self, identifier: &str) -> ImportedState {
        tracing::info!(identifier, "import person");
        ImportedState {
            identifier: identifier.to_owned(),
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Read-only lookup by `person_id`.
    ///
    /// Unlike [`Reconciler::read`], a missing record is an error here.
    pub fn lookup(&self, person_id: &str) -> Result<ResourceState, PersonError> {
        let id = schema::validate_person_id(person_id)?;
        tracing::debug!(person_id = %id, "lookup person");
        let person = self.client.read_person(&id)?;
        Ok(ResourceState::present(person))
    }

    /// Plan how to converge `prior` to `declared`.
    #[must_use]
    pub fn plan(&self, prior: &ResourceState, declared: &PersonSpec) -> ChangePlan {
        ChangePlan::diff(prior, declared)
    }

    /// All stored persons, ordered by id.
    pub fn list(&self) -> Result<Vec<PersonRecord>, PersonError> {
        self.client.list_persons()
    }

    fn read_back(&self, identifier: ExternalId) -> Result<ResourceState, PersonError> {
        match self.read_id(&identifier)? {
            ResourceState::Absent => Err(PersonError::NotFound(identifier.into_person_id())),
            present => Ok(present),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
