// The process-wide view of what is currently saved.
//
// The store owns the RosterEntry lifecycle and the last-error slot. Its
// in-memory entries only ever change from values a read returned or a
// successful write echoed back, with two documented exceptions: deletes are
// applied optimistically (the row disappears locally even when the
// transport fails), and a reorder keeps the optimistic order on failure,
// surfacing the error instead of rolling back.
//
// Saves are split into three steps so the orchestrator's spawned I/O tasks
// and the sequential async API share one policy: `plan_save` (pure: trim +
// delete-on-empty), `execute` (the backend call, no store borrow), and
// `apply_outcome` (memory reconciliation).

use tracing::{debug, info, warn};

use crate::backend::{BackendHandle, TransportError};
use crate::config::ScheduleMode;

use super::entry::{trim_members, EntryId, RosterEntry};

// ---------------------------------------------------------------------------
// Row addressing
// ---------------------------------------------------------------------------

/// Identifies a roster row the way the active addressing mode does:
/// fixed-slots rows by slot index, free-order rows by opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Slot(u32),
    Team(EntryId),
}

// ---------------------------------------------------------------------------
// Save plumbing
// ---------------------------------------------------------------------------

/// What a triggered save resolves to once the buffer is trimmed.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveAction {
    UpsertSlot {
        slot: u32,
        member1: String,
        member2: String,
    },
    /// Both trimmed names were empty: the row is deleted (delete-on-empty;
    /// "row absent" and "slot unassigned" are the same state).
    ClearSlot { slot: u32 },
    /// Free-order rows exist explicitly, so blanks are persisted rather
    /// than deleting; removal is its own command.
    UpdateTeam {
        id: EntryId,
        member1: String,
        member2: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(RosterEntry),
    Cleared(u32),
}

impl SaveOutcome {
    /// The confirmed values an editor resets to: the echoed record's
    /// members, or empty strings for a cleared row.
    pub fn confirmed_members(&self) -> (&str, &str) {
        match self {
            SaveOutcome::Saved(entry) => (&entry.member1, &entry.member2),
            SaveOutcome::Cleared(_) => ("", ""),
        }
    }
}

// ---------------------------------------------------------------------------
// RosterStore
// ---------------------------------------------------------------------------

pub struct RosterStore {
    backend: BackendHandle,
    mode: ScheduleMode,
    entries: Vec<RosterEntry>,
    last_error: Option<String>,
}

impl RosterStore {
    pub fn new(backend: BackendHandle, mode: ScheduleMode) -> Self {
        RosterStore {
            backend,
            mode,
            entries: Vec::new(),
            last_error: None,
        }
    }

    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    /// Shared backend handle for spawned I/O tasks.
    pub fn backend(&self) -> BackendHandle {
        self.backend.clone()
    }

    /// Current entries, ordered by the addressing key.
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn entry_at_slot(&self, slot: u32) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.position == slot)
    }

    pub fn entry_by_id(&self, id: &EntryId) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("roster operation failed: {message}");
        self.last_error = Some(message);
    }

    pub fn reset_error(&mut self) {
        self.last_error = None;
    }

    // -----------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------

    /// Fetch all entries. On failure the in-memory set keeps its previous
    /// value (empty on first load) and the error is recorded; no retry.
    pub async fn load(&mut self) -> Result<(), TransportError> {
        self.reset_error();
        match self.backend.select_all().await {
            Ok(entries) => {
                self.apply_load(entries);
                Ok(())
            }
            Err(err) => {
                self.record_error(err.message.clone());
                Err(err)
            }
        }
    }

    /// Replace the in-memory set with a freshly read one.
    pub fn apply_load(&mut self, mut entries: Vec<RosterEntry>) {
        entries.sort_by_key(|e| e.position);
        info!("roster loaded: {} entries", entries.len());
        self.entries = entries;
    }

    // -----------------------------------------------------------------
    // Save
    // -----------------------------------------------------------------

    /// Decide what a save of the given buffer means: trim both names, then
    /// delete-on-empty for slot-addressed rows, member update for
    /// id-addressed rows. Fails on a key/mode mismatch.
    pub fn plan_save(
        mode: ScheduleMode,
        key: &RowKey,
        member1: &str,
        member2: &str,
    ) -> Result<SaveAction, TransportError> {
        let (member1, member2) = trim_members(member1, member2);
        match (mode, key) {
            (ScheduleMode::FixedSlots, RowKey::Slot(slot)) => {
                if member1.is_empty() && member2.is_empty() {
                    Ok(SaveAction::ClearSlot { slot: *slot })
                } else {
                    Ok(SaveAction::UpsertSlot {
                        slot: *slot,
                        member1,
                        member2,
                    })
                }
            }
            (ScheduleMode::FreeOrder, RowKey::Team(id)) => Ok(SaveAction::UpdateTeam {
                id: id.clone(),
                member1,
                member2,
            }),
            _ => Err(TransportError::new(format!(
                "row key {key:?} does not match the {mode:?} addressing mode"
            ))),
        }
    }

    /// Run a planned save against the backend. Takes the backend handle
    /// rather than the store so spawned tasks can call it without holding
    /// a store borrow across the await.
    pub async fn execute(
        backend: &BackendHandle,
        action: &SaveAction,
    ) -> Result<SaveOutcome, TransportError> {
        match action {
            SaveAction::UpsertSlot {
                slot,
                member1,
                member2,
            } => {
                let entry = backend.upsert_slot(*slot, member1, member2).await?;
                Ok(SaveOutcome::Saved(entry))
            }
            SaveAction::ClearSlot { slot } => {
                backend.delete_by_slot(*slot).await?;
                Ok(SaveOutcome::Cleared(*slot))
            }
            SaveAction::UpdateTeam { id, member1, member2 } => {
                let entry = backend.update_members(id, member1, member2).await?;
                Ok(SaveOutcome::Saved(entry))
            }
        }
    }

    /// Reconcile a confirmed save result into memory: the echoed record
    /// replaces any prior entry for its key; a clear removes the row.
    pub fn apply_outcome(&mut self, outcome: &SaveOutcome) {
        match outcome {
            SaveOutcome::Saved(entry) => {
                let slot_addressed = self.mode == ScheduleMode::FixedSlots;
                self.entries.retain(|e| {
                    e.id != entry.id && !(slot_addressed && e.position == entry.position)
                });
                self.entries.push(entry.clone());
                self.entries.sort_by_key(|e| e.position);
                debug!(position = entry.position, "confirmed entry applied");
            }
            SaveOutcome::Cleared(slot) => {
                self.entries.retain(|e| e.position != *slot);
                debug!(slot, "cleared entry removed");
            }
        }
    }

    /// Save a slot's names in one sequential call: plan, execute, apply.
    /// Both-empty input deletes the row (see `SaveAction::ClearSlot`).
    pub async fn save_slot(
        &mut self,
        slot: u32,
        member1: &str,
        member2: &str,
    ) -> Result<SaveOutcome, TransportError> {
        let action = Self::plan_save(self.mode, &RowKey::Slot(slot), member1, member2)?;
        match Self::execute(&self.backend, &action).await {
            Ok(outcome) => {
                self.apply_outcome(&outcome);
                Ok(outcome)
            }
            Err(err) => {
                self.record_error(err.message.clone());
                Err(err)
            }
        }
    }

    /// Update a team's names in one sequential call (free-order mode).
    pub async fn update_team(
        &mut self,
        id: &EntryId,
        member1: &str,
        member2: &str,
    ) -> Result<RosterEntry, TransportError> {
        let action = Self::plan_save(self.mode, &RowKey::Team(id.clone()), member1, member2)?;
        match Self::execute(&self.backend, &action).await {
            Ok(outcome) => {
                self.apply_outcome(&outcome);
                match outcome {
                    SaveOutcome::Saved(entry) => Ok(entry),
                    SaveOutcome::Cleared(_) => unreachable!("team updates never clear"),
                }
            }
            Err(err) => {
                self.record_error(err.message.clone());
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------
    // Add / delete
    // -----------------------------------------------------------------

    /// The rank a newly added team takes: one past the last.
    pub fn next_rank(&self) -> u32 {
        self.entries.last().map_or(0, |e| e.position + 1)
    }

    /// Append an empty team row (free-order mode).
    pub async fn add_team(&mut self) -> Result<RosterEntry, TransportError> {
        if self.mode != ScheduleMode::FreeOrder {
            return Err(TransportError::new(
                "adding teams requires the free-order addressing mode",
            ));
        }
        match self.backend.insert_at(self.next_rank()).await {
            Ok(entry) => {
                self.apply_outcome(&SaveOutcome::Saved(entry.clone()));
                Ok(entry)
            }
            Err(err) => {
                self.record_error(err.message.clone());
                Err(err)
            }
        }
    }

    pub fn remove_slot_local(&mut self, slot: u32) {
        self.entries.retain(|e| e.position != slot);
    }

    pub fn remove_team_local(&mut self, id: &EntryId) {
        self.entries.retain(|e| &e.id != id);
    }

    /// Delete the row for `slot`. The local removal is optimistic: it is
    /// applied before the backend call and kept even if the call fails,
    /// with the failure surfaced through the last-error slot.
    pub async fn clear_slot(&mut self, slot: u32) {
        self.remove_slot_local(slot);
        if let Err(err) = self.backend.delete_by_slot(slot).await {
            self.record_error(err.message);
        }
    }

    /// Delete the team with the given id, optimistically like `clear_slot`.
    pub async fn delete_team(&mut self, id: &EntryId) {
        self.remove_team_local(id);
        if let Err(err) = self.backend.delete_by_id(id).await {
            self.record_error(err.message);
        }
    }

    // -----------------------------------------------------------------
    // Reorder
    // -----------------------------------------------------------------

    /// Dense zero-based ranks for the given id order, restricted to rows
    /// whose rank actually changes.
    pub fn plan_reorder(&self, ids: &[EntryId]) -> Vec<(EntryId, u32)> {
        ids.iter()
            .enumerate()
            .filter_map(|(rank, id)| {
                let rank = rank as u32;
                match self.entry_by_id(id) {
                    Some(entry) if entry.position == rank => None,
                    Some(_) => Some((id.clone(), rank)),
                    None => {
                        warn!("reorder references unknown id {id}");
                        None
                    }
                }
            })
            .collect()
    }

    /// Apply the new order to memory: positions become 0..N-1 in the order
    /// of `ids`.
    pub fn apply_reorder_local(&mut self, ids: &[EntryId]) {
        for (rank, id) in ids.iter().enumerate() {
            if let Some(entry) = self.entries.iter_mut().find(|e| &e.id == id) {
                entry.position = rank as u32;
            }
        }
        self.entries.sort_by_key(|e| e.position);
    }

    /// Reorder the roster to match `ids`, assigning dense ranks and
    /// persisting every changed row in one bulk position write. The local
    /// order is applied optimistically; on persistence failure the error
    /// is recorded and the optimistic order is kept (no rollback).
    pub async fn reorder(&mut self, ids: &[EntryId]) -> Result<(), TransportError> {
        if self.mode != ScheduleMode::FreeOrder {
            return Err(TransportError::new(
                "reordering requires the free-order addressing mode",
            ));
        }
        let ranks = self.plan_reorder(ids);
        self.apply_reorder_local(ids);
        if ranks.is_empty() {
            return Ok(());
        }
        if let Err(err) = self.backend.update_positions(&ranks).await {
            self.record_error(err.message.clone());
            return Err(err);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
