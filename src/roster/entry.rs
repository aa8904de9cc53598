// Roster records and slot arithmetic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by the backend when a row is created.
///
/// The hosted backend hands out UUIDs, the local SQLite backend hands out
/// rowids rendered as decimal strings. Callers treat both as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        EntryId(s.to_string())
    }
}

/// A server-confirmed roster record.
///
/// `position` is the addressing key: the fixed slot index in fixed-slots
/// mode, or the dense sort rank in free-order mode. At most one entry
/// exists per position when slot-addressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: EntryId,
    pub position: u32,
    pub member1: String,
    pub member2: String,
}

impl RosterEntry {
    /// Both names empty means the slot is unassigned.
    pub fn is_unassigned(&self) -> bool {
        self.member1.is_empty() && self.member2.is_empty()
    }
}

/// Trim both names. The only validation the roster performs.
pub fn trim_members(member1: &str, member2: &str) -> (String, String) {
    (member1.trim().to_string(), member2.trim().to_string())
}

/// Display label for a one-hour slot, wrapping past midnight.
///
/// With `first_hour = 16`, slot 0 is "16:00-17:00" and slot 11 is
/// "03:00-04:00".
pub fn slot_label(first_hour: u32, index: u32) -> String {
    let start = (first_hour + index) % 24;
    let end = (start + 1) % 24;
    format!("{start:02}:00-{end:02}:00")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
