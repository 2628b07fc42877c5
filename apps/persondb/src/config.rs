//! # Provider Configuration
//!
//! Where the store lives and which backend it uses.
//!
//! Resolution order, first hit wins:
//! 1. `--database` / `--backend` flags
//! 2. `CUSTOM_DATABASE_FILENAME` / `PERSONDB_BACKEND` environment variables
//!    (handled by clap, so they arrive here as flag values)
//! 3. TOML config file given with `--config`
//! 4. Backend defaults to `redb`; the database location has no default

use persondb_core::{BackendKind, PersonError, Reconciler};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Contents of a `persondb.toml` file.
///
/// ```toml
/// database_filename = "persons.redb"
/// backend = "redb"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub database_filename: Option<PathBuf>,
    pub backend: Option<BackendKind>,
}

impl FileConfig {
    /// Parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, PersonError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            PersonError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(PersonError::Configuration(format!(
                "config file {} exceeds {} bytes",
                path.display(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            PersonError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    /// Parse TOML text.
    pub fn parse(text: &str) -> Result<Self, PersonError> {
        toml::from_str(text).map_err(|e| PersonError::Configuration(e.to_string()))
    }
}

/// Fully resolved provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub database_filename: PathBuf,
    pub backend: BackendKind,
}

impl ProviderConfig {
    /// Merge flag values over the optional config file.
    ///
    /// # Errors
    ///
    /// `Configuration` if no database location is given for a persistent
    /// backend.
    pub fn resolve(
        database: Option<PathBuf>,
        backend: Option<BackendKind>,
        file: Option<FileConfig>,
    ) -> Result<Self, PersonError> {
        let file = file.unwrap_or_default();
        let backend = backend.or(file.backend).unwrap_or_default();
        let database_filename = database.or(file.database_filename).unwrap_or_default();

        if backend != BackendKind::Memory && database_filename.as_os_str().is_empty() {
            return Err(PersonError::Configuration(
                "database_filename is required (use --database or CUSTOM_DATABASE_FILENAME)"
                    .to_string(),
            ));
        }

        Ok(Self {
            database_filename,
            backend,
        })
    }

    /// Open the configured store.
    pub fn connect(&self) -> Result<Reconciler, PersonError> {
        Reconciler::configure(&self.database_filename, self.backend)
    }
}
