// Local SQLite implementation of the roster table.
//
// Used for development without a hosted backend and as the fast backend in
// tests (`:memory:`). The schema mirrors the hosted table: one key column
// named after the active addressing mode.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::ScheduleMode;
use crate::roster::entry::{EntryId, RosterEntry};

use super::{BackendResult, RosterBackend, TransportError};

pub struct SqliteBackend {
    conn: Mutex<Connection>,
    table: String,
    key_column: &'static str,
}

impl SqliteBackend {
    /// Open (or create) the roster database at `path` and ensure the table
    /// exists. Pass `":memory:"` for an ephemeral database.
    pub fn open(path: &str, table: &str, mode: ScheduleMode) -> BackendResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| TransportError::new(format!("failed to open database at {path}: {e}")))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| TransportError::new(format!("failed to set database pragmas: {e}")))?;

        let key_column = mode.key_column();
        // slot_index carries the per-slot uniqueness constraint; sort_order
        // is a dense rank and may be transiently duplicated mid-reorder.
        let key_constraint = match mode {
            ScheduleMode::FixedSlots => "INTEGER NOT NULL UNIQUE",
            ScheduleMode::FreeOrder => "INTEGER NOT NULL",
        };
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                {key_column} {key_constraint},
                member1  TEXT NOT NULL DEFAULT '',
                member2  TEXT NOT NULL DEFAULT ''
            );"
        ))
        .map_err(|e| TransportError::new(format!("failed to create {table} table: {e}")))?;

        Ok(SqliteBackend {
            conn: Mutex::new(conn),
            table: table.to_string(),
            key_column,
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    fn row_id(id: &EntryId) -> BackendResult<i64> {
        id.as_str()
            .parse::<i64>()
            .map_err(|_| TransportError::new(format!("invalid row id: {id}")))
    }

    fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RosterEntry> {
        let id: i64 = row.get(0)?;
        Ok(RosterEntry {
            id: EntryId(id.to_string()),
            position: row.get::<_, i64>(1)? as u32,
            member1: row.get(2)?,
            member2: row.get(3)?,
        })
    }
}

#[async_trait]
impl RosterBackend for SqliteBackend {
    async fn select_all(&self) -> BackendResult<Vec<RosterEntry>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, {key}, member1, member2 FROM {table} ORDER BY {key}",
                key = self.key_column,
                table = self.table,
            ))
            .map_err(TransportError::from)?;

        let entries = stmt
            .query_map([], Self::entry_from_row)
            .map_err(TransportError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(TransportError::from)?;

        Ok(entries)
    }

    async fn upsert_slot(
        &self,
        slot: u32,
        member1: &str,
        member2: &str,
    ) -> BackendResult<RosterEntry> {
        let conn = self.conn();
        let entry = conn
            .query_row(
                &format!(
                    "INSERT INTO {table} ({key}, member1, member2)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT({key}) DO UPDATE SET
                        member1 = excluded.member1,
                        member2 = excluded.member2
                     RETURNING id, {key}, member1, member2",
                    key = self.key_column,
                    table = self.table,
                ),
                params![slot, member1, member2],
                Self::entry_from_row,
            )
            .map_err(|e| TransportError::new(format!("upsert for slot {slot} failed: {e}")))?;
        Ok(entry)
    }

    async fn insert_at(&self, position: u32) -> BackendResult<RosterEntry> {
        let conn = self.conn();
        let entry = conn
            .query_row(
                &format!(
                    "INSERT INTO {table} ({key}, member1, member2)
                     VALUES (?1, '', '')
                     RETURNING id, {key}, member1, member2",
                    key = self.key_column,
                    table = self.table,
                ),
                params![position],
                Self::entry_from_row,
            )
            .map_err(|e| TransportError::new(format!("insert at rank {position} failed: {e}")))?;
        Ok(entry)
    }

    async fn update_members(
        &self,
        id: &EntryId,
        member1: &str,
        member2: &str,
    ) -> BackendResult<RosterEntry> {
        let row_id = Self::row_id(id)?;
        let conn = self.conn();
        let entry = conn
            .query_row(
                &format!(
                    "UPDATE {table} SET member1 = ?1, member2 = ?2
                     WHERE id = ?3
                     RETURNING id, {key}, member1, member2",
                    key = self.key_column,
                    table = self.table,
                ),
                params![member1, member2, row_id],
                Self::entry_from_row,
            )
            .optional()
            .map_err(TransportError::from)?
            .ok_or_else(|| TransportError::new(format!("no row with id {id}")))?;
        Ok(entry)
    }

    async fn update_positions(&self, ranks: &[(EntryId, u32)]) -> BackendResult<()> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| TransportError::new(format!("failed to begin transaction: {e}")))?;

        for (id, rank) in ranks {
            let row_id = Self::row_id(id)?;
            tx.execute(
                &format!(
                    "UPDATE {table} SET {key} = ?1 WHERE id = ?2",
                    key = self.key_column,
                    table = self.table,
                ),
                params![rank, row_id],
            )
            .map_err(|e| TransportError::new(format!("rank update for id {id} failed: {e}")))?;
        }

        tx.commit()
            .map_err(|e| TransportError::new(format!("failed to commit rank updates: {e}")))?;
        Ok(())
    }

    async fn delete_by_id(&self, id: &EntryId) -> BackendResult<()> {
        let row_id = Self::row_id(id)?;
        let conn = self.conn();
        conn.execute(
            &format!("DELETE FROM {table} WHERE id = ?1", table = self.table),
            params![row_id],
        )
        .map_err(|e| TransportError::new(format!("delete of id {id} failed: {e}")))?;
        Ok(())
    }

    async fn delete_by_slot(&self, slot: u32) -> BackendResult<()> {
        let conn = self.conn();
        conn.execute(
            &format!(
                "DELETE FROM {table} WHERE {key} = ?1",
                key = self.key_column,
                table = self.table,
            ),
            params![slot],
        )
        .map_err(|e| TransportError::new(format!("delete of slot {slot} failed: {e}")))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
