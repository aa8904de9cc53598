// Backend abstraction: the roster table's remote collaborator.
//
// The store talks to exactly one of these per process. Every failure,
// whether network, HTTP status, or SQL, collapses into a single
// `TransportError` carrying a human-readable message; the UI renders it
// inline and nothing retries automatically.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::roster::entry::{EntryId, RosterEntry};

pub mod rest;
pub mod sqlite;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// The only failure kind remote operations produce.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        TransportError {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::new(err.to_string())
    }
}

impl From<rusqlite::Error> for TransportError {
    fn from(err: rusqlite::Error) -> Self {
        TransportError::new(err.to_string())
    }
}

pub type BackendResult<T> = Result<T, TransportError>;

// ---------------------------------------------------------------------------
// RosterBackend trait
// ---------------------------------------------------------------------------

/// Shared handle to a backend, cloned into spawned I/O tasks.
pub type BackendHandle = Arc<dyn RosterBackend>;

/// The four logical table operations the roster needs, independent of the
/// concrete protocol. Implementations: a PostgREST-style hosted table
/// (`rest`) and a local SQLite file (`sqlite`).
#[async_trait]
pub trait RosterBackend: Send + Sync {
    /// All rows, ordered by the addressing key.
    async fn select_all(&self) -> BackendResult<Vec<RosterEntry>>;

    /// Insert-or-update keyed by the unique slot column, returning the
    /// resulting row. Atomic from the caller's perspective: two concurrent
    /// upserts to the same slot must never create two rows.
    async fn upsert_slot(&self, slot: u32, member1: &str, member2: &str)
        -> BackendResult<RosterEntry>;

    /// Create an empty row at the given rank (free-order mode).
    async fn insert_at(&self, position: u32) -> BackendResult<RosterEntry>;

    /// Update the members of a row identified by opaque id, returning the
    /// resulting row.
    async fn update_members(
        &self,
        id: &EntryId,
        member1: &str,
        member2: &str,
    ) -> BackendResult<RosterEntry>;

    /// Persist new ranks for the given rows.
    ///
    /// Atomicity is backend-dependent: SQLite applies all ranks in one
    /// transaction; the REST backend writes sequentially in list order and
    /// stops at the first failure, leaving later rows unpersisted.
    async fn update_positions(&self, ranks: &[(EntryId, u32)]) -> BackendResult<()>;

    /// Delete the row with the given id.
    async fn delete_by_id(&self, id: &EntryId) -> BackendResult<()>;

    /// Delete the row occupying the given slot, if any.
    async fn delete_by_slot(&self, slot: u32) -> BackendResult<()>;
}
