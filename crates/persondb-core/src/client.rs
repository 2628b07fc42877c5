//! # Store Client
//!
//! Typed façade over the record store. It picks the backend and translates
//! backend errors into [`PersonError`]; it holds no policy of its own.
//! Uniqueness and drift handling live in the [`crate::Reconciler`].
//!
//! ## Storage Backends
//!
//! - `Redb`: table form (ACID, persistent)
//! - `File`: JSON snapshot file (persistent, whole-file rewrite)
//! - `Memory`: volatile, for tests and dry runs

use crate::storage::{MemoryStore, RecordStore, RedbStore, SnapshotStore, StoreError};
use crate::{PersonError, PersonId, PersonRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// Which persisted representation a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// redb table (`persons`).
    #[default]
    Redb,
    /// Pretty-printed JSON snapshot file.
    File,
    /// Volatile in-memory map.
    Memory,
}

impl BackendKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = PersonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" | "table" => Ok(Self::Redb),
            "file" | "snapshot" | "json" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(PersonError::Configuration(format!(
                "unknown storage backend '{}' (expected redb, file or memory)",
                other
            ))),
        }
    }
}

/// The concrete store behind a client.
#[derive(Debug)]
pub enum StorageBackend {
    /// Disk-backed redb table.
    Table(RedbStore),
    /// Disk-backed JSON snapshot.
    Snapshot(SnapshotStore),
    /// Volatile map.
    Memory(MemoryStore),
}

impl StorageBackend {
    /// Open the backend of the given kind at `location`.
    ///
    /// `location` is ignored for the memory backend.
    pub fn open(location: &Path, kind: BackendKind) -> Result<Self, StoreError> {
        match kind {
            BackendKind::Redb => RedbStore::open(location).map(Self::Table),
            BackendKind::File => SnapshotStore::open(location).map(Self::Snapshot),
            BackendKind::Memory => Ok(Self::Memory(MemoryStore::new())),
        }
    }

    /// Which kind of backend this is.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Table(_) => BackendKind::Redb,
            Self::Snapshot(_) => BackendKind::File,
            Self::Memory(_) => BackendKind::Memory,
        }
    }

    fn store(&self) -> &dyn RecordStore {
        match self {
            Self::Table(store) => store,
            Self::Snapshot(store) => store,
            Self::Memory(store) => store,
        }
    }
}

// =============================================================================
// ERROR NORMALIZATION
// =============================================================================

impl From<StoreError> for PersonError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(id) => Self::AlreadyExists(id),
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Unavailable(msg) => Self::StorageUnavailable(msg),
            other @ (StoreError::Io(_) | StoreError::Corrupt(_)) => {
                Self::StorageUnavailable(other.to_string())
            }
        }
    }
}

// =============================================================================
// STORE CLIENT
// =============================================================================

/// Typed CRUD client over a [`StorageBackend`].
#[derive(Debug)]
pub struct StoreClient {
    backend: StorageBackend,
}

impl StoreClient {
    /// Open (and initialize) the store at `location`.
    pub fn open(location: &Path, kind: BackendKind) -> Result<Self, PersonError> {
        let backend = StorageBackend::open(location, kind)?;
        Ok(Self { backend })
    }

    /// Wrap an already opened backend.
    #[must_use]
    pub fn with_backend(backend: StorageBackend) -> Self {
        Self { backend }
    }

    /// A client over a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_backend(StorageBackend::Memory(MemoryStore::new()))
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Raw access to the record store, bypassing the client.
    ///
    /// Writes made through this handle are out-of-band as far as the
    /// reconciler is concerned.
    #[must_use]
    pub fn store(&self) -> &dyn RecordStore {
        self.backend.store()
    }

    pub fn create_person(&self, record: &PersonRecord) -> Result<(), PersonError> {
        Ok(self.store().put(record)?)
    }

    pub fn read_person(&self, id: &PersonId) -> Result<PersonRecord, PersonError> {
        Ok(self.store().get(id)?)
    }

    pub fn update_person(&self, record: &PersonRecord) -> Result<(), PersonError> {
        Ok(self.store().update(record)?)
    }

    pub fn delete_person(&self, id: &PersonId) -> Result<(), PersonError> {
        Ok(self.store().delete(id)?)
    }

    pub fn check_person_exists(&self, id: &PersonId) -> Result<bool, PersonError> {
        Ok(self.store().exists(id)?)
    }

    pub fn list_persons(&self) -> Result<Vec<PersonRecord>, PersonError> {
        Ok(self.store().list()?)
    }
}

// =============================================================================
// TESTS
// =============================================================================
