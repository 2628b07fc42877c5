//! # Fixed Primitives
//!
//! Compile-time constants shared by the schema, the identifier codec and the
//! storage backends. None of these are configurable at runtime.

/// Resource kind segment of every external identifier (`/person/<id>`).
pub const RESOURCE_KIND: &str = "person";

/// Separator used by the external identifier encoding.
pub const IDENTIFIER_SEPARATOR: char = '/';

// =============================================================================
// ATTRIBUTE BOUNDS
// =============================================================================

/// Minimum length of `last_name`, in characters.
pub const LAST_NAME_MIN_LENGTH: usize = 1;

/// Maximum length of `last_name`, in characters.
pub const LAST_NAME_MAX_LENGTH: usize = 30;

/// Maximum length of `person_id`, in bytes.
///
/// Keeps redb keys and snapshot keys small.
pub const PERSON_ID_MAX_LENGTH: usize = 256;

// =============================================================================
// STORAGE
// =============================================================================

/// Name of the redb table holding person rows.
pub const PERSONS_TABLE: &str = "persons";

/// Maximum accepted size of a snapshot file (64 MiB).
///
/// Checked before the file is parsed.
pub const MAX_SNAPSHOT_SIZE: u64 = 64 * 1024 * 1024;

/// Suffix of the temporary file a snapshot is written to before the rename.
pub const SNAPSHOT_TMP_SUFFIX: &str = "tmp";

/// Suffix of the sibling file locked while a snapshot is being mutated.
pub const SNAPSHOT_LOCK_SUFFIX: &str = "lock";
