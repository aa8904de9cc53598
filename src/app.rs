// Application state and orchestration logic.
//
// The central event loop that coordinates user commands from the TUI with
// completions of spawned backend tasks. Owns the roster store, one editor
// per visible row, the focus, and the per-row debounce timers, and pushes
// a fresh snapshot to the TUI render loop after every state change.
//
// Remote calls never run on this loop: each save, load, delete, and
// reorder is a spawned task that reports back through the io channel, so
// the user can keep typing while a request is in flight. Save and load
// completions are tagged with generation counters; a completion whose
// generation has been superseded is discarded without touching any state.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{Config, ScheduleMode};
use crate::editor::{EditState, Field, SavePolicy, SlotEditor};
use crate::protocol::{IoEvent, RosterSnapshot, RowView, UserCommand};
use crate::roster::entry::{slot_label, EntryId};
use crate::roster::store::{RosterStore, RowKey, SaveOutcome};

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    config: Config,
    store: RosterStore,
    policy: SavePolicy,
    editors: HashMap<RowKey, SlotEditor>,
    /// Pending debounce timer per row. Aborted and replaced on every
    /// keystroke, aborted outright when the row is removed.
    debounce: HashMap<RowKey, JoinHandle<()>>,
    selected: usize,
    active_field: Field,
    loading: bool,
    /// Monotonically increasing counter identifying the current load.
    /// Incremented each time a reload is spawned; results from stale
    /// loads are discarded in `handle_io`.
    load_generation: u64,
    /// True while an add-team insert is in flight, so a second add can't
    /// race it for the same rank.
    adding: bool,
    /// Sender for io completions; spawned tasks use a clone of this to
    /// report back to the event loop.
    io_tx: mpsc::Sender<IoEvent>,
}

impl AppState {
    pub fn new(config: Config, store: RosterStore, io_tx: mpsc::Sender<IoEvent>) -> Self {
        let policy = config.save.save_policy();
        let mut state = AppState {
            config,
            store,
            policy,
            editors: HashMap::new(),
            debounce: HashMap::new(),
            selected: 0,
            active_field: Field::Member1,
            loading: false,
            load_generation: 0,
            adding: false,
            io_tx,
        };
        state.refresh_editors();
        state
    }

    pub fn store(&self) -> &RosterStore {
        &self.store
    }

    // -----------------------------------------------------------------
    // Row bookkeeping
    // -----------------------------------------------------------------

    /// The rows currently on screen, in display order.
    fn row_keys(&self) -> Vec<RowKey> {
        match self.config.schedule.mode {
            ScheduleMode::FixedSlots => (0..self.config.schedule.slot_count)
                .map(RowKey::Slot)
                .collect(),
            ScheduleMode::FreeOrder => self
                .store
                .entries()
                .iter()
                .map(|e| RowKey::Team(e.id.clone()))
                .collect(),
        }
    }

    fn row_label(&self, index: usize, key: &RowKey) -> String {
        match key {
            RowKey::Slot(slot) => slot_label(self.config.schedule.first_hour, *slot),
            RowKey::Team(_) => format!("Team {}", index + 1),
        }
    }

    /// The confirmed values the store holds for a row; absent rows are
    /// blank (delete-on-empty makes those the same state).
    fn confirmed_members(&self, key: &RowKey) -> (String, String) {
        let entry = match key {
            RowKey::Slot(slot) => self.store.entry_at_slot(*slot),
            RowKey::Team(id) => self.store.entry_by_id(id),
        };
        match entry {
            Some(e) => (e.member1.clone(), e.member2.clone()),
            None => (String::new(), String::new()),
        }
    }

    /// Bring the editor set in line with the current rows: create editors
    /// for rows that just appeared, drop editors (and their timers) for
    /// rows that are gone, and push confirmed values into idle editors.
    fn refresh_editors(&mut self) {
        let keys = self.row_keys();

        let stale: Vec<RowKey> = self
            .editors
            .keys()
            .filter(|k| !keys.contains(k))
            .cloned()
            .collect();
        for key in stale {
            self.editors.remove(&key);
            self.cancel_flush(&key);
        }

        for key in &keys {
            let (m1, m2) = self.confirmed_members(key);
            self.editors
                .entry(key.clone())
                .and_modify(|editor| {
                    editor.apply_confirmed(&m1, &m2);
                })
                .or_insert_with(|| SlotEditor::new(&m1, &m2));
        }

        self.selected = self.selected.min(keys.len().saturating_sub(1));
    }

    fn selected_key(&self) -> Option<RowKey> {
        self.row_keys().get(self.selected).cloned()
    }

    // -----------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------

    pub(crate) fn begin_load(&mut self) {
        self.loading = true;
        self.load_generation += 1;
        let generation = self.load_generation;
        let backend = self.store.backend();
        let io_tx = self.io_tx.clone();
        tokio::spawn(async move {
            let result = backend.select_all().await;
            let _ = io_tx.send(IoEvent::LoadFinished { generation, result }).await;
        });
    }

    // -----------------------------------------------------------------
    // Save triggering
    // -----------------------------------------------------------------

    /// Run the configured policy after a buffer change.
    fn after_edit(&mut self, key: RowKey) {
        match self.policy {
            SavePolicy::Explicit => {}
            SavePolicy::Immediate => self.trigger_save(&key),
            SavePolicy::Debounced(interval) => {
                self.cancel_flush(&key);
                let io_tx = self.io_tx.clone();
                let flush_key = key.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(interval).await;
                    let _ = io_tx.send(IoEvent::FlushDue { key: flush_key }).await;
                });
                self.debounce.insert(key, handle);
            }
        }
    }

    fn cancel_flush(&mut self, key: &RowKey) {
        if let Some(handle) = self.debounce.remove(key) {
            handle.abort();
        }
    }

    /// Hand the row's buffer to the store if it diverges from the
    /// confirmed values. Spawns the backend call and returns immediately.
    fn trigger_save(&mut self, key: &RowKey) {
        let Some(editor) = self.editors.get_mut(key) else {
            return;
        };
        let Some(pending) = editor.begin_save() else {
            return;
        };
        let action = match RosterStore::plan_save(
            self.store.mode(),
            key,
            &pending.member1,
            &pending.member2,
        ) {
            Ok(action) => action,
            Err(err) => {
                editor.save_failed(pending.generation);
                self.store.record_error(err.message);
                return;
            }
        };

        debug!(?key, generation = pending.generation, "save dispatched");
        let backend = self.store.backend();
        let io_tx = self.io_tx.clone();
        let key = key.clone();
        tokio::spawn(async move {
            let result = RosterStore::execute(&backend, &action).await;
            let _ = io_tx
                .send(IoEvent::SaveFinished {
                    key,
                    generation: pending.generation,
                    result,
                })
                .await;
        });
    }

    // -----------------------------------------------------------------
    // Command handling
    // -----------------------------------------------------------------

    pub fn handle_command(&mut self, command: UserCommand) {
        match command {
            UserCommand::Quit => {}
            UserCommand::Reload => {
                self.store.reset_error();
                self.begin_load();
            }
            UserCommand::SelectNext => {
                let rows = self.row_keys().len();
                if rows > 0 && self.selected + 1 < rows {
                    self.selected += 1;
                }
            }
            UserCommand::SelectPrev => {
                self.selected = self.selected.saturating_sub(1);
            }
            UserCommand::ToggleField => {
                self.active_field = self.active_field.other();
            }
            UserCommand::TypeChar(ch) => {
                if let Some(key) = self.selected_key() {
                    if let Some(editor) = self.editors.get_mut(&key) {
                        editor.push_char(self.active_field, ch);
                        self.after_edit(key);
                    }
                }
            }
            UserCommand::Backspace => {
                if let Some(key) = self.selected_key() {
                    if let Some(editor) = self.editors.get_mut(&key) {
                        if editor.backspace(self.active_field) {
                            self.after_edit(key);
                        }
                    }
                }
            }
            UserCommand::Save => {
                if let Some(key) = self.selected_key() {
                    self.cancel_flush(&key);
                    self.trigger_save(&key);
                }
            }
            UserCommand::Clear => self.clear_selected(),
            UserCommand::AddTeam => self.add_team(),
            UserCommand::DeleteTeam => self.delete_selected_team(),
            UserCommand::MoveUp => self.move_selected(-1),
            UserCommand::MoveDown => self.move_selected(1),
        }
    }

    /// Blank the focused slot and save the clear straight away, whatever
    /// the policy (the clear control always persists immediately).
    fn clear_selected(&mut self) {
        if self.config.schedule.mode != ScheduleMode::FixedSlots {
            return;
        }
        let Some(key) = self.selected_key() else {
            return;
        };
        if let Some(editor) = self.editors.get_mut(&key) {
            editor.clear_fields();
            self.cancel_flush(&key);
            self.trigger_save(&key);
        }
    }

    fn add_team(&mut self) {
        if self.config.schedule.mode != ScheduleMode::FreeOrder || self.adding {
            return;
        }
        self.adding = true;
        let rank = self.store.next_rank();
        let backend = self.store.backend();
        let io_tx = self.io_tx.clone();
        tokio::spawn(async move {
            let result = backend.insert_at(rank).await;
            let _ = io_tx.send(IoEvent::AddFinished { result }).await;
        });
    }

    /// Remove the focused team. The local removal is optimistic: the row,
    /// its editor, and its timer go away before the backend answers.
    fn delete_selected_team(&mut self) {
        if self.config.schedule.mode != ScheduleMode::FreeOrder {
            return;
        }
        let Some(RowKey::Team(id)) = self.selected_key() else {
            return;
        };
        let key = RowKey::Team(id.clone());
        self.cancel_flush(&key);
        self.editors.remove(&key);
        self.store.remove_team_local(&id);
        self.refresh_editors();

        let backend = self.store.backend();
        let io_tx = self.io_tx.clone();
        tokio::spawn(async move {
            let result = backend.delete_by_id(&id).await;
            let _ = io_tx.send(IoEvent::DeleteFinished { result }).await;
        });
    }

    /// Swap the focused team with its neighbour and persist the resulting
    /// dense ranks. The new order is applied locally first; a persistence
    /// failure is surfaced without rolling the order back.
    fn move_selected(&mut self, delta: i32) {
        if self.config.schedule.mode != ScheduleMode::FreeOrder {
            return;
        }
        let count = self.store.entries().len();
        let from = self.selected;
        let to = from as i32 + delta;
        if to < 0 || to as usize >= count {
            return;
        }
        let to = to as usize;

        let mut ids: Vec<EntryId> = self.store.entries().iter().map(|e| e.id.clone()).collect();
        ids.swap(from, to);

        let ranks = self.store.plan_reorder(&ids);
        self.store.apply_reorder_local(&ids);
        self.selected = to;

        if ranks.is_empty() {
            return;
        }
        let backend = self.store.backend();
        let io_tx = self.io_tx.clone();
        tokio::spawn(async move {
            let result = backend.update_positions(&ranks).await;
            let _ = io_tx.send(IoEvent::ReorderFinished { result }).await;
        });
    }

    // -----------------------------------------------------------------
    // Io completion handling
    // -----------------------------------------------------------------

    pub fn handle_io(&mut self, event: IoEvent) {
        match event {
            IoEvent::LoadFinished { generation, result } => {
                if generation != self.load_generation {
                    debug!(generation, "discarding stale load result");
                    return;
                }
                self.loading = false;
                match result {
                    Ok(entries) => {
                        self.store.apply_load(entries);
                        self.refresh_editors();
                    }
                    Err(err) => self.store.record_error(err.message),
                }
            }

            IoEvent::SaveFinished {
                key,
                generation,
                result,
            } => {
                let Some(editor) = self.editors.get_mut(&key) else {
                    // The row was removed while the request was in flight.
                    debug!(?key, "save completed for a removed row");
                    return;
                };
                match result {
                    Ok(outcome) => {
                        let (m1, m2) = outcome.confirmed_members();
                        if editor.save_succeeded(generation, m1, m2) {
                            self.store.apply_outcome(&outcome);
                        } else {
                            debug!(?key, generation, "discarding stale save confirmation");
                        }
                    }
                    Err(err) => {
                        if editor.save_failed(generation) {
                            self.store.record_error(err.message);
                        } else {
                            debug!(?key, generation, "discarding stale save failure");
                        }
                    }
                }
            }

            IoEvent::AddFinished { result } => {
                self.adding = false;
                match result {
                    Ok(entry) => {
                        self.store.apply_outcome(&SaveOutcome::Saved(entry.clone()));
                        self.refresh_editors();
                        // Focus the new row so the user can start typing.
                        if let Some(index) = self
                            .store
                            .entries()
                            .iter()
                            .position(|e| e.id == entry.id)
                        {
                            self.selected = index;
                            self.active_field = Field::Member1;
                        }
                    }
                    Err(err) => self.store.record_error(err.message),
                }
            }

            IoEvent::DeleteFinished { result } => {
                if let Err(err) = result {
                    self.store.record_error(err.message);
                }
            }

            IoEvent::ReorderFinished { result } => {
                if let Err(err) = result {
                    self.store.record_error(err.message);
                }
            }

            IoEvent::FlushDue { key } => {
                self.debounce.remove(&key);
                self.trigger_save(&key);
            }
        }
    }

    // -----------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------

    pub fn build_snapshot(&self) -> RosterSnapshot {
        let rows = self
            .row_keys()
            .iter()
            .enumerate()
            .map(|(index, key)| {
                let label = self.row_label(index, key);
                match self.editors.get(key) {
                    Some(editor) => RowView {
                        label,
                        member1: editor.member1().to_string(),
                        member2: editor.member2().to_string(),
                        state: editor.state(),
                        dirty: editor.dirty(),
                    },
                    None => {
                        let (member1, member2) = self.confirmed_members(key);
                        RowView {
                            label,
                            member1,
                            member2,
                            state: EditState::Clean,
                            dirty: false,
                        }
                    }
                }
            })
            .collect();

        RosterSnapshot {
            mode: self.config.schedule.mode,
            rows,
            selected: self.selected,
            active_field: self.active_field,
            error: self.store.last_error().map(str::to_string),
            loading: self.loading,
        }
    }

    fn abort_timers(&mut self) {
        for (_, handle) in self.debounce.drain() {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// The main orchestration loop.
///
/// Listens on two channels using `tokio::select!`:
/// - `cmd_rx`: user commands from the TUI
/// - `io_rx`: completions of spawned backend tasks and debounce expiries
///
/// A snapshot is pushed to `ui_tx` after every handled event. Returns when
/// the user quits or the command channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut io_rx: mpsc::Receiver<IoEvent>,
    ui_tx: mpsc::Sender<RosterSnapshot>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    state.begin_load();
    let _ = ui_tx.send(state.build_snapshot()).await;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => state.handle_command(cmd),
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
                let _ = ui_tx.send(state.build_snapshot()).await;
            }

            event = io_rx.recv() => {
                match event {
                    Some(event) => state.handle_io(event),
                    None => {
                        warn!("Io channel closed unexpectedly");
                        break;
                    }
                }
                let _ = ui_tx.send(state.build_snapshot()).await;
            }
        }
    }

    state.abort_timers();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::backend::sqlite::SqliteBackend;
    use crate::config::{
        BackendConfig, BackendKind, Config, CredentialsConfig, RestSection, SaveConfig,
        SavePolicyKind, ScheduleConfig, ScheduleMode, SqliteSection,
    };
    use crate::protocol::IoEvent;

    fn test_config(mode: ScheduleMode, policy: SavePolicyKind) -> Config {
        Config {
            schedule: ScheduleConfig {
                mode,
                first_hour: 16,
                slot_count: 12,
            },
            save: SaveConfig {
                policy,
                debounce_ms: 300,
            },
            backend: BackendConfig {
                kind: BackendKind::Sqlite,
                table: "teams".to_string(),
                sqlite: SqliteSection {
                    path: ":memory:".to_string(),
                },
                rest: RestSection::default(),
            },
            credentials: CredentialsConfig::default(),
        }
    }

    fn test_state(
        mode: ScheduleMode,
        policy: SavePolicyKind,
    ) -> (AppState, mpsc::Receiver<IoEvent>) {
        let (io_tx, io_rx) = mpsc::channel(64);
        let backend = SqliteBackend::open(":memory:", "teams", mode)
            .expect("in-memory database should open");
        let store = RosterStore::new(Arc::new(backend), mode);
        let state = AppState::new(test_config(mode, policy), store, io_tx);
        (state, io_rx)
    }

    /// Drive one command and pump io completions until the channel is
    /// momentarily quiet.
    async fn settle(state: &mut AppState, io_rx: &mut mpsc::Receiver<IoEvent>) {
        loop {
            match tokio::time::timeout(Duration::from_millis(500), io_rx.recv()).await {
                Ok(Some(event)) => state.handle_io(event),
                Ok(None) => break,
                Err(_) => break,
            }
        }
    }

    fn type_str(state: &mut AppState, text: &str) {
        for ch in text.chars() {
            state.handle_command(UserCommand::TypeChar(ch));
        }
    }

    #[tokio::test]
    async fn fixed_mode_creates_an_editor_per_slot() {
        let (state, _io_rx) = test_state(ScheduleMode::FixedSlots, SavePolicyKind::Explicit);
        let snapshot = state.build_snapshot();
        assert_eq!(snapshot.rows.len(), 12);
        assert_eq!(snapshot.rows[0].label, "16:00-17:00");
        assert_eq!(snapshot.rows[11].label, "03:00-04:00");
        assert!(snapshot.rows.iter().all(|r| !r.dirty));
    }

    #[tokio::test]
    async fn explicit_policy_saves_only_on_command() {
        let (mut state, mut io_rx) = test_state(ScheduleMode::FixedSlots, SavePolicyKind::Explicit);

        type_str(&mut state, "Alice");
        let snapshot = state.build_snapshot();
        assert_eq!(snapshot.rows[0].state, EditState::Editing);

        // Nothing was dispatched yet.
        assert!(io_rx.try_recv().is_err());

        state.handle_command(UserCommand::Save);
        settle(&mut state, &mut io_rx).await;

        let snapshot = state.build_snapshot();
        assert_eq!(snapshot.rows[0].state, EditState::Clean);
        assert_eq!(snapshot.rows[0].member1, "Alice");
        assert_eq!(state.store().entry_at_slot(0).unwrap().member1, "Alice");
    }

    #[tokio::test]
    async fn immediate_policy_saves_every_divergence() {
        let (mut state, mut io_rx) =
            test_state(ScheduleMode::FixedSlots, SavePolicyKind::Immediate);

        state.handle_command(UserCommand::TypeChar('A'));
        settle(&mut state, &mut io_rx).await;

        assert_eq!(state.store().entry_at_slot(0).unwrap().member1, "A");
        assert_eq!(state.build_snapshot().rows[0].state, EditState::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_waits_for_idle_and_restarts_on_keystrokes() {
        let (mut state, mut io_rx) =
            test_state(ScheduleMode::FixedSlots, SavePolicyKind::Debounced);

        state.handle_command(UserCommand::TypeChar('A'));
        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(io_rx.try_recv().is_err());

        // Another keystroke inside the idle window restarts the countdown.
        state.handle_command(UserCommand::TypeChar('l'));
        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(io_rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(150)).await;
        settle(&mut state, &mut io_rx).await;

        assert_eq!(state.store().entry_at_slot(0).unwrap().member1, "Al");
        assert_eq!(state.build_snapshot().rows[0].state, EditState::Clean);
    }

    #[tokio::test]
    async fn clear_deletes_the_slot_row() {
        let (mut state, mut io_rx) = test_state(ScheduleMode::FixedSlots, SavePolicyKind::Explicit);

        type_str(&mut state, "Alice");
        state.handle_command(UserCommand::Save);
        settle(&mut state, &mut io_rx).await;
        assert!(state.store().entry_at_slot(0).is_some());

        state.handle_command(UserCommand::Clear);
        settle(&mut state, &mut io_rx).await;
        assert!(state.store().entry_at_slot(0).is_none());
        assert_eq!(state.build_snapshot().rows[0].member1, "");
    }

    #[tokio::test]
    async fn load_refreshes_idle_rows_only() {
        let (mut state, mut io_rx) = test_state(ScheduleMode::FixedSlots, SavePolicyKind::Explicit);

        // Seed the backend through a save on slot 0.
        type_str(&mut state, "Alice");
        state.handle_command(UserCommand::Save);
        settle(&mut state, &mut io_rx).await;

        // Start editing slot 1, then reload.
        state.handle_command(UserCommand::SelectNext);
        type_str(&mut state, "Bo");
        state.handle_command(UserCommand::Reload);
        settle(&mut state, &mut io_rx).await;

        let snapshot = state.build_snapshot();
        // The idle row reflects the reload; the edited row kept its buffer.
        assert_eq!(snapshot.rows[0].member1, "Alice");
        assert_eq!(snapshot.rows[0].state, EditState::Clean);
        assert_eq!(snapshot.rows[1].member1, "Bo");
        assert_eq!(snapshot.rows[1].state, EditState::Editing);
    }

    #[tokio::test]
    async fn add_delete_and_move_teams() {
        let (mut state, mut io_rx) = test_state(ScheduleMode::FreeOrder, SavePolicyKind::Debounced);

        state.handle_command(UserCommand::AddTeam);
        settle(&mut state, &mut io_rx).await;
        state.handle_command(UserCommand::AddTeam);
        settle(&mut state, &mut io_rx).await;
        assert_eq!(state.store().entries().len(), 2);

        // Name the second (focused) team, flush via explicit save.
        type_str(&mut state, "Carol");
        state.handle_command(UserCommand::Save);
        settle(&mut state, &mut io_rx).await;
        let second_id = state.store().entries()[1].id.clone();
        assert_eq!(state.store().entries()[1].member1, "Carol");

        // Move it to the top and check dense ranks.
        state.handle_command(UserCommand::MoveUp);
        settle(&mut state, &mut io_rx).await;
        assert_eq!(state.store().entries()[0].id, second_id);
        let ranks: Vec<u32> = state.store().entries().iter().map(|e| e.position).collect();
        assert_eq!(ranks, vec![0, 1]);

        // Delete the focused (top) row.
        state.handle_command(UserCommand::DeleteTeam);
        settle(&mut state, &mut io_rx).await;
        assert_eq!(state.store().entries().len(), 1);
        assert!(state.store().entry_by_id(&second_id).is_none());
    }

    #[tokio::test]
    async fn save_completion_for_removed_row_is_ignored() {
        let (mut state, mut io_rx) = test_state(ScheduleMode::FreeOrder, SavePolicyKind::Explicit);

        state.handle_command(UserCommand::AddTeam);
        settle(&mut state, &mut io_rx).await;
        type_str(&mut state, "Alice");
        state.handle_command(UserCommand::Save);

        // Delete the row before pumping the save completion.
        state.handle_command(UserCommand::DeleteTeam);
        settle(&mut state, &mut io_rx).await;

        // The completion for the deleted row must not resurrect it.
        assert!(state.store().entries().is_empty());
        assert!(state.build_snapshot().rows.is_empty());
    }

    #[tokio::test]
    async fn selection_is_clamped_to_rows() {
        let (mut state, _io_rx) = test_state(ScheduleMode::FixedSlots, SavePolicyKind::Explicit);
        for _ in 0..40 {
            state.handle_command(UserCommand::SelectNext);
        }
        assert_eq!(state.build_snapshot().selected, 11);
        for _ in 0..40 {
            state.handle_command(UserCommand::SelectPrev);
        }
        assert_eq!(state.build_snapshot().selected, 0);
    }

    #[tokio::test]
    async fn toggle_field_switches_typing_target() {
        let (mut state, mut io_rx) = test_state(ScheduleMode::FixedSlots, SavePolicyKind::Explicit);

        type_str(&mut state, "Alice");
        state.handle_command(UserCommand::ToggleField);
        type_str(&mut state, "Bob");
        state.handle_command(UserCommand::Save);
        settle(&mut state, &mut io_rx).await;

        let entry = state.store().entry_at_slot(0).unwrap();
        assert_eq!(entry.member1, "Alice");
        assert_eq!(entry.member2, "Bob");
    }
}
