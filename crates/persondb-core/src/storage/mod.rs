//! # Record Store
//!
//! Durable keyed storage of person records.
//!
//! Every backend implements [`RecordStore`] with the same contract:
//! - `put` enforces primary-key uniqueness (`DuplicateKey`)
//! - `update` and `delete` on a missing id fail with `NotFound`
//! - every operation is atomic with respect to every other operation
//! - I/O failures are returned, never retried
//!
//! ## Backends
//!
//! - [`RedbStore`]: table form, one redb transaction per operation
//! - [`SnapshotStore`]: pretty-printed JSON snapshot, rewritten on every mutation
//! - [`MemoryStore`]: volatile map, same semantics, nothing on disk

mod memory;
mod redb_store;
mod snapshot;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;
pub use snapshot::SnapshotStore;

use crate::{PersonId, PersonRecord};
use thiserror::Error;

// =============================================================================
// RECORDSTORE TRAIT
// =============================================================================

/// Capability interface shared by all storage backends.
///
/// Methods take `&self`: each backend synchronizes internally, so a store can
/// be shared across threads without an outer lock.
pub trait RecordStore: Send + Sync {
    /// Ensure the backing table or file exists. Idempotent.
    fn initialize(&self) -> Result<(), StoreError>;

    /// Insert a new record. Fails with `DuplicateKey` if the id is taken.
    fn put(&self, record: &PersonRecord) -> Result<(), StoreError>;

    /// Fetch a record by id.
    fn get(&self, id: &PersonId) -> Result<PersonRecord, StoreError>;

    /// Overwrite `last_name` and `first_name` of an existing record.
    fn update(&self, record: &PersonRecord) -> Result<(), StoreError>;

    /// Remove a record. Fails with `NotFound` if nothing was removed.
    fn delete(&self, id: &PersonId) -> Result<(), StoreError>;

    /// Check whether a record exists.
    fn exists(&self, id: &PersonId) -> Result<bool, StoreError>;

    /// All records, ordered by id.
    fn list(&self) -> Result<Vec<PersonRecord>, StoreError>;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Backend-level storage errors.
///
/// The store client maps these onto [`crate::PersonError`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing medium could not be opened or created.
    #[error("cannot open store: {0}")]
    Unavailable(String),

    /// A read or write against an open store failed.
    #[error("store I/O error: {0}")]
    Io(String),

    /// Persisted data could not be decoded.
    #[error("corrupt store data: {0}")]
    Corrupt(String),

    /// `put` found an existing record with the same primary key.
    #[error("duplicate key: {0}")]
    DuplicateKey(PersonId),

    /// No record exists for the id.
    #[error("no record for key: {0}")]
    NotFound(PersonId),
}
