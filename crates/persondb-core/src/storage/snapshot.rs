//! # Snapshot-file Record Store
//!
//! The snapshot form of the person store: the whole store is one
//! pretty-printed JSON object mapping `person_id` to its columns.
//!
//! ```json
//! {
//!   "p1": {
//!     "last_name": "Doe",
//!     "first_name": "Jane"
//!   }
//! }
//! ```
//!
//! Every mutation loads the entire file, changes it and writes it back under
//! two locks:
//! - an in-process `RwLock` shared by every handle on the same canonical
//!   path (mutations hold the write side across load → mutate → save, reads
//!   hold the read side)
//! - an exclusive lock on the sibling `<path>.lock` file, held for the whole
//!   mutation so separate processes serialize too
//!
//! Saves go to a uniquely named sibling temp file that is fsynced and renamed
//! over the snapshot, then the directory is fsynced. Readers therefore always
//! see a complete snapshot and need no file lock.

use super::{RecordStore, StoreError};
use crate::primitives::{MAX_SNAPSHOT_SIZE, SNAPSHOT_LOCK_SUFFIX, SNAPSHOT_TMP_SUFFIX};
use crate::{PersonId, PersonRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Non-key columns of a person as written to the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SnapshotRow {
    last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
}

/// In-memory image of the snapshot file. BTreeMap keeps the output sorted.
type Snapshot = BTreeMap<String, SnapshotRow>;

// =============================================================================
// PROCESS-WIDE LOCKS
// =============================================================================

/// One lock per canonical snapshot path, shared by every handle in the process.
static PATH_LOCKS: OnceLock<Mutex<BTreeMap<PathBuf, Arc<RwLock<()>>>>> = OnceLock::new();

/// Distinguishes temp files written by the same process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn shared_lock(path: &Path) -> Result<Arc<RwLock<()>>, StoreError> {
    let registry = PATH_LOCKS.get_or_init(|| Mutex::new(BTreeMap::new()));
    let mut locks = registry
        .lock()
        .map_err(|_| StoreError::Io("snapshot lock registry poisoned".to_string()))?;
    Ok(Arc::clone(locks.entry(path.to_path_buf()).or_default()))
}

/// Absolute path with the parent directory resolved, so every spelling of the
/// same file maps to the same lock. The file itself may not exist yet.
fn canonical_location(path: &Path) -> Result<PathBuf, StoreError> {
    let file_name = path.file_name().ok_or_else(|| {
        StoreError::Unavailable(format!("{}: not a file path", path.display()))
    })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = fs::canonicalize(parent)
        .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;
    Ok(dir.join(file_name))
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Releases the cross-process lock when dropped.
struct FileLockGuard<'a>(&'a File);

impl Drop for FileLockGuard<'_> {
    fn drop(&mut self) {
        let _ = self.0.unlock();
    }
}

// =============================================================================
// SNAPSHOT STORE
// =============================================================================

/// A person store persisted as a single JSON snapshot file.
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    lock: Arc<RwLock<()>>,
    lock_path: PathBuf,
    lock_file: File,
}

impl SnapshotStore {
    /// Open a snapshot store, creating an empty snapshot if the file is absent.
    ///
    /// An existing file is accepted as-is and validated by loading it once.
    /// Handles opened on the same file share one lock.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = canonical_location(path.as_ref())?;
        let lock_path = sibling(&path, SNAPSHOT_LOCK_SUFFIX);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", lock_path.display(), e)))?;

        let store = Self {
            lock: shared_lock(&path)?,
            path,
            lock_path,
            lock_file,
        };
        store.initialize()?;
        Ok(store)
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<'_, ()>, StoreError> {
        self.lock
            .read()
            .map_err(|_| StoreError::Io("snapshot lock poisoned".to_string()))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<'_, ()>, StoreError> {
        self.lock
            .write()
            .map_err(|_| StoreError::Io("snapshot lock poisoned".to_string()))
    }

    /// Exclusive lock on `<path>.lock` against other processes. Callers must
    /// hold the in-process write lock first.
    fn file_lock(&self) -> Result<FileLockGuard<'_>, StoreError> {
        self.lock_file
            .lock()
            .map_err(|e| StoreError::Io(format!("{}: {}", self.lock_path.display(), e)))?;
        Ok(FileLockGuard(&self.lock_file))
    }

    /// Load the snapshot. Callers must hold the lock.
    fn load(&self) -> Result<Snapshot, StoreError> {
        let metadata = fs::metadata(&self.path)
            .map_err(|e| StoreError::Io(format!("{}: {}", self.path.display(), e)))?;
        if metadata.len() > MAX_SNAPSHOT_SIZE {
            return Err(StoreError::Corrupt(format!(
                "snapshot size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_SNAPSHOT_SIZE
            )));
        }

        let data = fs::read(&self.path)
            .map_err(|e| StoreError::Io(format!("{}: {}", self.path.display(), e)))?;
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Snapshot::new());
        }
        serde_json::from_slice(&data).map_err(|e| {
            StoreError::Corrupt(format!("{}: {}", self.path.display(), e))
        })
    }

    /// Write the snapshot through a temp file and rename. Callers must hold
    /// both write locks.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut data = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        data.push(b'\n');

        let tmp_path = self.tmp_path();
        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Io(format!("{}: {}", self.path.display(), e))
        })?;

        // Make the rename itself durable
        if let Some(parent) = self.path.parent()
            && let Ok(dir) = File::open(parent)
        {
            let _ = dir.sync_all();
        }
        Ok(())
    }

    /// `<path>.<pid>.<n>.tmp`, unique per save.
    fn tmp_path(&self) -> PathBuf {
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        sibling(
            &self.path,
            &format!("{}.{}.{}", std::process::id(), n, SNAPSHOT_TMP_SUFFIX),
        )
    }

    /// Run a read-modify-write cycle under both write locks.
    ///
    /// The snapshot is only written back when `f` succeeds.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Snapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock()?;
        let _file_guard = self.file_lock()?;
        let mut snapshot = self.load()?;
        let out = f(&mut snapshot)?;
        self.save(&snapshot)?;
        Ok(out)
    }
}

// =============================================================================
// RECORDSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl RecordStore for SnapshotStore {
    fn initialize(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock()?;
        let result = self.file_lock().and_then(|_file_guard| {
            if self.path.exists() {
                self.load().map(|_| ())
            } else {
                self.save(&Snapshot::new())
            }
        });
        result.map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn put(&self, record: &PersonRecord) -> Result<(), StoreError> {
        self.mutate(|snapshot| {
            if snapshot.contains_key(record.id.as_str()) {
                return Err(StoreError::DuplicateKey(record.id.clone()));
            }
            snapshot.insert(
                record.id.as_str().to_owned(),
                SnapshotRow {
                    last_name: record.last_name.clone(),
                    first_name: record.first_name.clone(),
                },
            );
            Ok(())
        })
    }

    fn get(&self, id: &PersonId) -> Result<PersonRecord, StoreError> {
        let _guard = self.read_lock()?;
        let mut snapshot = self.load()?;
        snapshot
            .remove(id.as_str())
            .map(|row| PersonRecord::new(id.clone(), row.last_name, row.first_name))
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn update(&self, record: &PersonRecord) -> Result<(), StoreError> {
        self.mutate(|snapshot| {
            let row = snapshot
                .get_mut(record.id.as_str())
                .ok_or_else(|| StoreError::NotFound(record.id.clone()))?;
            row.last_name = record.last_name.clone();
            row.first_name = record.first_name.clone();
            Ok(())
        })
    }

    fn delete(&self, id: &PersonId) -> Result<(), StoreError> {
        self.mutate(|snapshot| {
            snapshot
                .remove(id.as_str())
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(id.clone()))
        })
    }

    fn exists(&self, id: &PersonId) -> Result<bool, StoreError> {
        let _guard = self.read_lock()?;
        Ok(self.load()?.contains_key(id.as_str()))
    }

    fn list(&self) -> Result<Vec<PersonRecord>, StoreError> {
        let _guard = self.read_lock()?;
        Ok(self
            .load()?
            .into_iter()
            .map(|(id, row)| PersonRecord::new(PersonId::new(id), row.last_name, row.first_name))
            .collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
