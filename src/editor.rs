// Per-slot edit buffer and save-triggering state machine.
//
// Each roster row on screen owns one `SlotEditor`. The editor tracks the
// local buffer against the last server-confirmed values and decides how a
// confirmed update, a save trigger, or a save completion changes its state.
// In-flight edits always win over late-arriving reloads: a confirmed push
// only resets the buffer while the editor is `Clean`.
//
// Same-key saves are ordered by a per-editor generation number. Every
// trigger issues a new generation; a completion whose generation is not the
// latest issued is stale and must be discarded by the caller (the orchestrator
// drops it without touching the store).

use std::time::Duration;

/// When an edited buffer is handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /// Only on an explicit save keypress.
    Explicit,
    /// After an idle period with no further keystrokes.
    Debounced(Duration),
    /// On every divergence, immediately.
    Immediate,
}

impl SavePolicy {
    /// The idle interval, when the policy has one.
    pub fn debounce(&self) -> Option<Duration> {
        match self {
            SavePolicy::Debounced(interval) => Some(*interval),
            _ => None,
        }
    }
}

/// Which name field a keystroke targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Member1,
    Member2,
}

impl Field {
    pub fn other(self) -> Field {
        match self {
            Field::Member1 => Field::Member2,
            Field::Member2 => Field::Member1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// Buffer matches the confirmed values; nothing pending.
    Clean,
    /// Buffer diverges; the user is typing.
    Editing,
    /// A save for this editor's buffer is in flight.
    Saving,
}

/// A save the editor has handed off, identified by its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub generation: u64,
    pub member1: String,
    pub member2: String,
}

#[derive(Debug, Clone)]
pub struct SlotEditor {
    member1: String,
    member2: String,
    confirmed1: String,
    confirmed2: String,
    state: EditState,
    /// Latest issued save generation. Zero means no save was ever issued.
    generation: u64,
    /// The buffer contents handed to the latest issued save, used to tell
    /// "buffer unchanged since the trigger" from "user typed mid-flight".
    submitted: Option<(String, String)>,
}

impl SlotEditor {
    /// Create an editor whose buffer starts at the confirmed values.
    pub fn new(confirmed1: &str, confirmed2: &str) -> Self {
        SlotEditor {
            member1: confirmed1.to_string(),
            member2: confirmed2.to_string(),
            confirmed1: confirmed1.to_string(),
            confirmed2: confirmed2.to_string(),
            state: EditState::Clean,
            generation: 0,
            submitted: None,
        }
    }

    pub fn member1(&self) -> &str {
        &self.member1
    }

    pub fn member2(&self) -> &str {
        &self.member2
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    /// True iff the buffer diverges from the last-known confirmed values.
    pub fn dirty(&self) -> bool {
        self.member1 != self.confirmed1 || self.member2 != self.confirmed2
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Member1 => &mut self.member1,
            Field::Member2 => &mut self.member2,
        }
    }

    /// A keystroke moves a `Clean` (or post-save `Saving`) buffer into
    /// `Editing`. `Saving` stays `Saving`: the flight is not cancelled, its
    /// completion is reconciled against the new buffer when it lands.
    fn after_keystroke(&mut self) {
        if self.state == EditState::Clean {
            self.state = EditState::Editing;
        }
    }

    /// Append a character to a field. Returns true (the buffer changed).
    pub fn push_char(&mut self, field: Field, ch: char) -> bool {
        self.field_mut(field).push(ch);
        self.after_keystroke();
        true
    }

    /// Delete the last character of a field. Returns false if the field was
    /// already empty.
    pub fn backspace(&mut self, field: Field) -> bool {
        if self.field_mut(field).pop().is_none() {
            return false;
        }
        self.after_keystroke();
        true
    }

    /// Blank both fields (the clear control). Returns false if both fields
    /// were already empty.
    pub fn clear_fields(&mut self) -> bool {
        if self.member1.is_empty() && self.member2.is_empty() {
            return false;
        }
        self.member1.clear();
        self.member2.clear();
        self.after_keystroke();
        true
    }

    /// Hand the buffer off for saving.
    ///
    /// Returns `None` when there is nothing to save: the buffer matches the
    /// confirmed values, in which case an `Editing` editor settles back to
    /// `Clean` (the user typed their way back to the saved state). Otherwise
    /// issues a fresh generation and moves to `Saving`.
    pub fn begin_save(&mut self) -> Option<PendingSave> {
        if !self.dirty() {
            if self.state == EditState::Editing {
                self.state = EditState::Clean;
            }
            return None;
        }
        self.generation += 1;
        self.state = EditState::Saving;
        self.submitted = Some((self.member1.clone(), self.member2.clone()));
        Some(PendingSave {
            generation: self.generation,
            member1: self.member1.clone(),
            member2: self.member2.clone(),
        })
    }

    /// True iff `generation` is the latest issued for this editor.
    pub fn is_latest(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Apply a successful save confirmation.
    ///
    /// Returns false (and changes nothing) when the completion is stale.
    /// Otherwise the returned record's values (empty strings when the save
    /// cleared the row) become the confirmed values. The buffer resets to
    /// them and the editor returns to `Clean`, unless the user kept typing
    /// during the flight: then the buffer is kept and the editor stays in
    /// `Editing`. The reset matters even for an untouched buffer, because
    /// the store may echo a normalized form of what was submitted (trimmed
    /// whitespace).
    pub fn save_succeeded(&mut self, generation: u64, member1: &str, member2: &str) -> bool {
        if !self.is_latest(generation) {
            return false;
        }
        let untouched = self
            .submitted
            .as_ref()
            .is_some_and(|(s1, s2)| *s1 == self.member1 && *s2 == self.member2);
        self.submitted = None;
        self.confirmed1 = member1.to_string();
        self.confirmed2 = member2.to_string();
        if untouched {
            self.member1 = self.confirmed1.clone();
            self.member2 = self.confirmed2.clone();
        }
        self.state = if self.dirty() {
            EditState::Editing
        } else {
            EditState::Clean
        };
        true
    }

    /// Apply a failed save. The buffer is retained so the user does not
    /// lose typed input. Returns false when the completion is stale.
    pub fn save_failed(&mut self, generation: u64) -> bool {
        if !self.is_latest(generation) {
            return false;
        }
        self.submitted = None;
        self.state = EditState::Editing;
        true
    }

    /// Apply a confirmed update pushed from the store (a reload or another
    /// writer's echo). Refreshes an idle editor; never overwrites a buffer
    /// that is being edited or has a save in flight. Returns whether the
    /// buffer was reset.
    pub fn apply_confirmed(&mut self, member1: &str, member2: &str) -> bool {
        if self.state != EditState::Clean {
            return false;
        }
        self.confirmed1 = member1.to_string();
        self.confirmed2 = member2.to_string();
        self.member1 = self.confirmed1.clone();
        self.member2 = self.confirmed2.clone();
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(editor: &mut SlotEditor, field: Field, text: &str) {
        for ch in text.chars() {
            editor.push_char(field, ch);
        }
    }

    #[test]
    fn keystroke_moves_clean_to_editing() {
        let mut editor = SlotEditor::new("", "");
        assert_eq!(editor.state(), EditState::Clean);
        assert!(!editor.dirty());

        editor.push_char(Field::Member1, 'A');
        assert_eq!(editor.state(), EditState::Editing);
        assert!(editor.dirty());
    }

    #[test]
    fn typing_back_to_confirmed_clears_dirty() {
        let mut editor = SlotEditor::new("Al", "");
        editor.push_char(Field::Member1, 'f');
        assert!(editor.dirty());
        editor.backspace(Field::Member1);
        assert!(!editor.dirty());

        // Nothing to save; the editor settles back to Clean.
        assert!(editor.begin_save().is_none());
        assert_eq!(editor.state(), EditState::Clean);
    }

    #[test]
    fn begin_save_issues_increasing_generations() {
        let mut editor = SlotEditor::new("", "");
        type_str(&mut editor, Field::Member1, "Alice");
        let first = editor.begin_save().unwrap();

        editor.push_char(Field::Member2, 'B');
        let second = editor.begin_save().unwrap();

        assert!(second.generation > first.generation);
        assert!(!editor.is_latest(first.generation));
        assert!(editor.is_latest(second.generation));
    }

    #[test]
    fn save_success_resets_to_clean() {
        let mut editor = SlotEditor::new("", "");
        type_str(&mut editor, Field::Member1, "Alice");
        let pending = editor.begin_save().unwrap();
        assert_eq!(editor.state(), EditState::Saving);

        assert!(editor.save_succeeded(pending.generation, "Alice", ""));
        assert_eq!(editor.state(), EditState::Clean);
        assert!(!editor.dirty());
        assert_eq!(editor.member1(), "Alice");
    }

    #[test]
    fn save_success_resets_buffer_to_normalized_echo() {
        let mut editor = SlotEditor::new("", "");
        type_str(&mut editor, Field::Member1, " Alice ");
        let pending = editor.begin_save().unwrap();

        // The store echoes the trimmed form.
        assert!(editor.save_succeeded(pending.generation, "Alice", ""));
        assert_eq!(editor.member1(), "Alice");
        assert_eq!(editor.state(), EditState::Clean);
        assert!(!editor.dirty());
    }

    #[test]
    fn save_success_with_concurrent_typing_stays_editing() {
        let mut editor = SlotEditor::new("", "");
        type_str(&mut editor, Field::Member1, "Al");
        let pending = editor.begin_save().unwrap();

        // The user keeps typing while the request is in flight.
        type_str(&mut editor, Field::Member1, "ice");

        assert!(editor.save_succeeded(pending.generation, "Al", ""));
        assert_eq!(editor.state(), EditState::Editing);
        assert!(editor.dirty());
        assert_eq!(editor.member1(), "Alice");
    }

    #[test]
    fn save_failure_retains_buffer() {
        let mut editor = SlotEditor::new("", "");
        type_str(&mut editor, Field::Member1, "Alice");
        let pending = editor.begin_save().unwrap();

        assert!(editor.save_failed(pending.generation));
        assert_eq!(editor.state(), EditState::Editing);
        assert_eq!(editor.member1(), "Alice");
        assert!(editor.dirty());
    }

    #[test]
    fn stale_completions_are_discarded() {
        let mut editor = SlotEditor::new("", "");
        type_str(&mut editor, Field::Member1, "Al");
        let first = editor.begin_save().unwrap();

        type_str(&mut editor, Field::Member1, "ice");
        let second = editor.begin_save().unwrap();

        // The older response arrives after the newer one was issued.
        assert!(!editor.save_succeeded(first.generation, "Al", ""));
        assert_eq!(editor.state(), EditState::Saving);
        assert_eq!(editor.member1(), "Alice");

        assert!(editor.save_succeeded(second.generation, "Alice", ""));
        assert_eq!(editor.state(), EditState::Clean);
    }

    #[test]
    fn stale_failure_is_discarded() {
        let mut editor = SlotEditor::new("", "");
        editor.push_char(Field::Member1, 'A');
        let first = editor.begin_save().unwrap();
        editor.push_char(Field::Member1, 'B');
        let second = editor.begin_save().unwrap();

        assert!(!editor.save_failed(first.generation));
        assert_eq!(editor.state(), EditState::Saving);
        assert!(editor.save_failed(second.generation));
        assert_eq!(editor.state(), EditState::Editing);
    }

    #[test]
    fn confirmed_push_refreshes_clean_editor() {
        let mut editor = SlotEditor::new("Alice", "Bob");
        assert!(editor.apply_confirmed("Carol", "Dan"));
        assert_eq!(editor.member1(), "Carol");
        assert_eq!(editor.member2(), "Dan");
        assert!(!editor.dirty());
    }

    #[test]
    fn confirmed_push_never_overwrites_edits() {
        let mut editor = SlotEditor::new("Alice", "Bob");
        type_str(&mut editor, Field::Member2, "by");

        assert!(!editor.apply_confirmed("Alice", "Bob"));
        assert_eq!(editor.member2(), "Bobby");
        assert_eq!(editor.state(), EditState::Editing);

        // Same while a save is in flight.
        let pending = editor.begin_save().unwrap();
        assert!(!editor.apply_confirmed("Carol", "Dan"));
        assert_eq!(editor.member2(), "Bobby");
        assert!(editor.is_latest(pending.generation));
    }

    #[test]
    fn clear_fields_blanks_both_and_marks_editing() {
        let mut editor = SlotEditor::new("Alice", "Bob");
        assert!(editor.clear_fields());
        assert_eq!(editor.member1(), "");
        assert_eq!(editor.member2(), "");
        assert_eq!(editor.state(), EditState::Editing);
        assert!(editor.dirty());

        let mut empty = SlotEditor::new("", "");
        assert!(!empty.clear_fields());
        assert_eq!(empty.state(), EditState::Clean);
    }

    #[test]
    fn backspace_on_empty_field_is_a_no_op() {
        let mut editor = SlotEditor::new("", "");
        assert!(!editor.backspace(Field::Member1));
        assert_eq!(editor.state(), EditState::Clean);
    }

    #[test]
    fn policy_debounce_interval() {
        assert_eq!(SavePolicy::Explicit.debounce(), None);
        assert_eq!(SavePolicy::Immediate.debounce(), None);
        assert_eq!(
            SavePolicy::Debounced(Duration::from_millis(300)).debounce(),
            Some(Duration::from_millis(300))
        );
    }
}
