//! Volatile record store. Same contract as the persistent backends, nothing
//! is written to disk.

use super::{RecordStore, StoreError};
use crate::{PersonId, PersonRecord};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory person store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<PersonId, PersonRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<PersonId, PersonRecord>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Io("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<PersonId, PersonRecord>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Io("memory store lock poisoned".to_string()))
    }
}

impl RecordStore for MemoryStore {
    fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn put(&self, record: &PersonRecord) -> Result<(), StoreError> {
        let mut records = self.write()?;
        if records.contains_key(&record.id) {
            return Err(StoreError::DuplicateKey(record.id.clone()));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn get(&self, id: &PersonId) -> Result<PersonRecord, StoreError> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn update(&self, record: &PersonRecord) -> Result<(), StoreError> {
        let mut records = self.write()?;
        let slot = records
            .get_mut(&record.id)
            .ok_or_else(|| StoreError::NotFound(record.id.clone()))?;
        *slot = record.clone();
        Ok(())
    }

    fn delete(&self, id: &PersonId) -> Result<(), StoreError> {
        self.write()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn exists(&self, id: &PersonId) -> Result<bool, StoreError> {
        Ok(self.read()?.contains_key(id))
    }

    fn list(&self) -> Result<Vec<PersonRecord>, StoreError> {
        Ok(self.read()?.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforces_unique_keys() {
        let store = MemoryStore::new();
        let record = PersonRecord::new(PersonId::new("p1"), "Doe", None);

        store.put(&record).expect("put");
        assert!(matches!(store.put(&record), Err(StoreError::DuplicateKey(_))));
        assert_eq!(store.list().expect("list").len(), 1);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.delete(&PersonId::new("p1")),
            Err(StoreError::NotFound(_))
        ));
    }
}
