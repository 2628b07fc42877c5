//! # redb-backed Record Store
//!
//! The table form of the person store, backed by the redb embedded database:
//! - one table, `persons`, keyed by `person_id`
//! - values are postcard-encoded `(last_name, first_name)` pairs
//! - every operation runs in its own transaction
//!
//! redb serializes write transactions and gives readers MVCC snapshots, so
//! no lock is held here beyond what the database provides. The uniqueness
//! check in `put` and the insert run in the same write transaction, which is
//! what makes two racing inserts of one key resolve to exactly one winner.

use super::{RecordStore, StoreError};
use crate::primitives::PERSONS_TABLE;
use crate::{PersonId, PersonRecord};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};

/// Table for persons: person_id -> postcard `(last_name, first_name)`
const PERSONS: TableDefinition<&str, &[u8]> = TableDefinition::new(PERSONS_TABLE);

/// A disk-backed person store using redb.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn io_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Io(e.to_string())
}

fn encode(record: &PersonRecord) -> Result<Vec<u8>, StoreError> {
    postcard::to_allocvec(&(record.last_name.as_str(), record.first_name.as_deref()))
        .map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn decode(id: PersonId, bytes: &[u8]) -> Result<PersonRecord, StoreError> {
    let (last_name, first_name): (String, Option<String>) =
        postcard::from_bytes(bytes).map_err(|e| {
            StoreError::Corrupt(format!("row for '{}' cannot be decoded: {}", id, e))
        })?;
    Ok(PersonRecord::new(id, last_name, first_name))
}

impl RedbStore {
    /// Open or create a person database at the given path.
    ///
    /// The `persons` table is created if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path).map_err(|e| {
            StoreError::Unavailable(format!("{}: {}", path.display(), e))
        })?;
        let store = Self { db, path };
        store.initialize()?;
        Ok(store)
    }
}

// =============================================================================
// RECORDSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl RecordStore for RedbStore {
    fn initialize(&self) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let _ = write_txn
            .open_table(PERSONS)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        write_txn
            .commit()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    fn put(&self, record: &PersonRecord) -> Result<(), StoreError> {
        let bytes = encode(record)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let inserted = {
            let mut table = write_txn.open_table(PERSONS).map_err(io_err)?;
            if table.get(record.id.as_str()).map_err(io_err)?.is_some() {
                false
            } else {
                table
                    .insert(record.id.as_str(), bytes.as_slice())
                    .map_err(io_err)?;
                true
            }
        };

        if !inserted {
            write_txn.abort().map_err(io_err)?;
            return Err(StoreError::DuplicateKey(record.id.clone()));
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn get(&self, id: &PersonId) -> Result<PersonRecord, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(PERSONS).map_err(io_err)?;

        match table.get(id.as_str()).map_err(io_err)? {
            Some(data) => decode(id.clone(), data.value()),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    fn update(&self, record: &PersonRecord) -> Result<(), StoreError> {
        let bytes = encode(record)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let updated = {
            let mut table = write_txn.open_table(PERSONS).map_err(io_err)?;
            if table.get(record.id.as_str()).map_err(io_err)?.is_none() {
                false
            } else {
                table
                    .insert(record.id.as_str(), bytes.as_slice())
                    .map_err(io_err)?;
                true
            }
        };

        if !updated {
            write_txn.abort().map_err(io_err)?;
            return Err(StoreError::NotFound(record.id.clone()));
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn delete(&self, id: &PersonId) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let removed = {
            let mut table = write_txn.open_table(PERSONS).map_err(io_err)?;
            table.remove(id.as_str()).map_err(io_err)?.is_some()
        };

        if !removed {
            write_txn.abort().map_err(io_err)?;
            return Err(StoreError::NotFound(id.clone()));
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn exists(&self, id: &PersonId) -> Result<bool, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(PERSONS).map_err(io_err)?;
        Ok(table.get(id.as_str()).map_err(io_err)?.is_some())
    }

    fn list(&self) -> Result<Vec<PersonRecord>, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(PERSONS).map_err(io_err)?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (key, value) = entry.map_err(io_err)?;
            records.push(decode(PersonId::new(key.value()), value.value())?);
        }
        Ok(records)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn person(id: &str, last: &str, first: Option<&str>) -> PersonRecord {
        PersonRecord::new(PersonId::new(id), last, first.map(str::to_owned))
    }

    #[test]
    fn put_then_get() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("persons.redb")).expect("open db");

        store.put(&person("p1", "Doe", Some("Jane"))).expect("put");
        let record = store.get(&PersonId::new("p1")).expect("get");

        assert_eq!(record, person("p1", "Doe", Some("Jane")));
    }

    #[test]
    fn put_rejects_duplicate_key() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("persons.redb")).expect("open db");

        store.put(&person("p1", "Doe", None)).expect("put");
        let result = store.put(&person("p1", "Other", None));

        assert!(matches!(result, Err(StoreError::DuplicateKey(ref id)) if id.as_str() == "p1"));
        // First write wins
        assert_eq!(store.get(&PersonId::new("p1")).expect("get").last_name, "Doe");
    }

    #[test]
    fn missing_first_name_stays_none() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("persons.redb")).expect("open db");

        store.put(&person("p1", "Doe", None)).expect("put");
        assert_eq!(store.get(&PersonId::new("p1")).expect("get").first_name, None);
    }

    #[test]
    fn update_and_delete_missing_are_not_found() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("persons.redb")).expect("open db");

        assert!(matches!(
            store.update(&person("ghost", "Doe", None)),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&PersonId::new("ghost")),
            Err(StoreError::NotFound(_))
        ));
        assert!(!store.exists(&PersonId::new("ghost")).expect("exists"));
    }

    #[test]
    fn update_overwrites_fields() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("persons.redb")).expect("open db");

        store.put(&person("p1", "Doe", Some("Jane"))).expect("put");
        store.update(&person("p1", "Doe", None)).expect("update");

        assert_eq!(store.get(&PersonId::new("p1")).expect("get"), person("p1", "Doe", None));
    }

    #[test]
    fn persistence() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("persons.redb");

        // Create and populate
        {
            let store = RedbStore::open(&db_path).expect("open db");
            store.put(&person("a", "Alpha", None)).expect("put");
            store.put(&person("b", "Beta", Some("B"))).expect("put");
        }

        // Reopen and verify
        {
            let store = RedbStore::open(&db_path).expect("reopen db");
            let ids: Vec<_> = store
                .list()
                .expect("list")
                .into_iter()
                .map(|r| r.id.as_str().to_owned())
                .collect();
            assert_eq!(ids, vec!["a", "b"]);
            assert!(store.exists(&PersonId::new("b")).expect("exists"));
        }
    }

    #[test]
    fn initialize_is_idempotent() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("persons.redb")).expect("open db");
        store.put(&person("p1", "Doe", None)).expect("put");

        store.initialize().expect("second initialize");
        assert!(store.exists(&PersonId::new("p1")).expect("exists"));
    }

    #[test]
    fn open_fails_for_missing_directory() {
        let temp = tempdir().expect("temp dir");
        let result = RedbStore::open(temp.path().join("no-such-dir").join("persons.redb"));
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
