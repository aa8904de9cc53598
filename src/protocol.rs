// Message types exchanged between the TUI and the orchestrator.
//
// The TUI translates keystrokes into `UserCommand`s; spawned backend tasks
// report `IoEvent` completions; the orchestrator answers both with a fresh
// `RosterSnapshot` for the render loop to display.

use crate::backend::TransportError;
use crate::config::ScheduleMode;
use crate::editor::{EditState, Field};
use crate::roster::entry::RosterEntry;
use crate::roster::store::{RowKey, SaveOutcome};

/// Commands the TUI sends to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Quit,
    /// Re-fetch the roster from the backend.
    Reload,
    SelectNext,
    SelectPrev,
    /// Switch between the two name fields of the focused row.
    ToggleField,
    TypeChar(char),
    Backspace,
    /// Explicit save of the focused row.
    Save,
    /// Blank both names of the focused slot and save the clear.
    Clear,
    /// Append an empty team (free-order mode).
    AddTeam,
    /// Delete the focused team (free-order mode).
    DeleteTeam,
    MoveUp,
    MoveDown,
}

/// Completions of spawned backend tasks, plus debounce expiries.
///
/// Load and save completions carry the generation they were issued under;
/// the orchestrator discards any whose generation has been superseded.
#[derive(Debug)]
pub enum IoEvent {
    LoadFinished {
        generation: u64,
        result: Result<Vec<RosterEntry>, TransportError>,
    },
    SaveFinished {
        key: RowKey,
        generation: u64,
        result: Result<SaveOutcome, TransportError>,
    },
    AddFinished {
        result: Result<RosterEntry, TransportError>,
    },
    DeleteFinished {
        result: Result<(), TransportError>,
    },
    ReorderFinished {
        result: Result<(), TransportError>,
    },
    /// A row's debounce timer expired with no further keystrokes.
    FlushDue { key: RowKey },
}

/// One renderable roster row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub label: String,
    pub member1: String,
    pub member2: String,
    pub state: EditState,
    pub dirty: bool,
}

/// Everything the TUI needs to draw a frame.
#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    pub mode: ScheduleMode,
    pub rows: Vec<RowView>,
    pub selected: usize,
    pub active_field: Field,
    pub error: Option<String>,
    pub loading: bool,
}

impl Default for RosterSnapshot {
    fn default() -> Self {
        RosterSnapshot {
            mode: ScheduleMode::FixedSlots,
            rows: Vec::new(),
            selected: 0,
            active_field: Field::Member1,
            error: None,
            loading: true,
        }
    }
}

impl RosterSnapshot {
    /// Number of rows with a save in flight.
    pub fn saving_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.state == EditState::Saving)
            .count()
    }
}
