//! # persondb-core
//!
//! Record store and reconciliation core for persondb - THE LOGIC.
//!
//! A declared person (`person_id`, `last_name`, optional `first_name`) is
//! reconciled against a persisted store through create/read/update/delete
//! and import operations that are safe to drive from a desired-state loop.
//!
//! ## Layers
//!
//! ```text
//! Reconciler  ── lifecycle, identifier encoding, drift, immutability
//!     │
//! StoreClient ── backend selection, error normalization
//!     │
//! RecordStore ── RedbStore | SnapshotStore | MemoryStore
//! ```
//!
//! ## Architectural Constraints
//!
//! - No async, no network: every call is synchronous local I/O
//! - The store is the only shared mutable state; each backend synchronizes
//!   its own operations
//! - Raw identifiers are parsed into [`ExternalId`] at the boundary
//! - Failures are [`PersonError`] values; nothing here panics

// =============================================================================
// MODULES
// =============================================================================

pub mod client;
pub mod identifier;
pub mod plan;
pub mod primitives;
pub mod reconciler;
pub mod schema;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{PersonError, PersonId, PersonRecord, PersonSpec};

// =============================================================================
// RE-EXPORTS: Store + Reconciler
// =============================================================================

pub use client::{BackendKind, StorageBackend, StoreClient};
pub use identifier::ExternalId;
pub use plan::ChangePlan;
pub use reconciler::{ImportedState, Reconciler, ResourceState};
pub use storage::{MemoryStore, RecordStore, RedbStore, SnapshotStore, StoreError};
