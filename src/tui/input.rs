// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// orchestrator. Printable characters always go to the focused name field,
// so quitting and the roster controls live on Esc and Ctrl chords.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::ScheduleMode;
use crate::protocol::UserCommand;

use super::ViewState;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press maps to a command for
/// the orchestrator, `None` when it should be ignored (key release, or a
/// control that does not apply in the current addressing mode).
pub fn handle_key(key_event: KeyEvent, view_state: &ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress; ignoring
    // non-Press events prevents double-processing.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    let mode = view_state.snapshot.mode;
    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl {
        return match key_event.code {
            KeyCode::Char('c') => Some(UserCommand::Quit),
            KeyCode::Char('r') => Some(UserCommand::Reload),
            KeyCode::Char('k') if mode == ScheduleMode::FixedSlots => Some(UserCommand::Clear),
            KeyCode::Char('n') if mode == ScheduleMode::FreeOrder => Some(UserCommand::AddTeam),
            KeyCode::Char('d') if mode == ScheduleMode::FreeOrder => Some(UserCommand::DeleteTeam),
            KeyCode::Up if mode == ScheduleMode::FreeOrder => Some(UserCommand::MoveUp),
            KeyCode::Down if mode == ScheduleMode::FreeOrder => Some(UserCommand::MoveDown),
            _ => None,
        };
    }

    match key_event.code {
        KeyCode::Esc => Some(UserCommand::Quit),
        KeyCode::Up => Some(UserCommand::SelectPrev),
        KeyCode::Down => Some(UserCommand::SelectNext),
        KeyCode::Tab | KeyCode::BackTab => Some(UserCommand::ToggleField),
        KeyCode::Enter => Some(UserCommand::Save),
        KeyCode::Backspace => Some(UserCommand::Backspace),
        KeyCode::Char(ch) => Some(UserCommand::TypeChar(ch)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RosterSnapshot;

    fn state(mode: ScheduleMode) -> ViewState {
        ViewState {
            snapshot: RosterSnapshot {
                mode,
                ..RosterSnapshot::default()
            },
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    #[test]
    fn printable_characters_type_into_the_field() {
        let s = state(ScheduleMode::FixedSlots);
        assert_eq!(
            handle_key(press(KeyCode::Char('q')), &s),
            Some(UserCommand::TypeChar('q'))
        );
        assert_eq!(
            handle_key(press(KeyCode::Char('Å')), &s),
            Some(UserCommand::TypeChar('Å'))
        );
    }

    #[test]
    fn esc_and_ctrl_c_quit() {
        let s = state(ScheduleMode::FixedSlots);
        assert_eq!(handle_key(press(KeyCode::Esc), &s), Some(UserCommand::Quit));
        assert_eq!(
            handle_key(ctrl(KeyCode::Char('c')), &s),
            Some(UserCommand::Quit)
        );
    }

    #[test]
    fn navigation_and_save_keys() {
        let s = state(ScheduleMode::FixedSlots);
        assert_eq!(
            handle_key(press(KeyCode::Up), &s),
            Some(UserCommand::SelectPrev)
        );
        assert_eq!(
            handle_key(press(KeyCode::Down), &s),
            Some(UserCommand::SelectNext)
        );
        assert_eq!(
            handle_key(press(KeyCode::Tab), &s),
            Some(UserCommand::ToggleField)
        );
        assert_eq!(
            handle_key(press(KeyCode::Enter), &s),
            Some(UserCommand::Save)
        );
    }

    #[test]
    fn mode_gates_the_row_controls() {
        let fixed = state(ScheduleMode::FixedSlots);
        assert_eq!(
            handle_key(ctrl(KeyCode::Char('k')), &fixed),
            Some(UserCommand::Clear)
        );
        assert_eq!(handle_key(ctrl(KeyCode::Char('n')), &fixed), None);
        assert_eq!(handle_key(ctrl(KeyCode::Up), &fixed), None);

        let free = state(ScheduleMode::FreeOrder);
        assert_eq!(handle_key(ctrl(KeyCode::Char('k')), &free), None);
        assert_eq!(
            handle_key(ctrl(KeyCode::Char('n')), &free),
            Some(UserCommand::AddTeam)
        );
        assert_eq!(
            handle_key(ctrl(KeyCode::Char('d')), &free),
            Some(UserCommand::DeleteTeam)
        );
        assert_eq!(
            handle_key(ctrl(KeyCode::Up), &free),
            Some(UserCommand::MoveUp)
        );
        assert_eq!(
            handle_key(ctrl(KeyCode::Down), &free),
            Some(UserCommand::MoveDown)
        );
    }

    #[test]
    fn key_release_is_ignored() {
        let s = state(ScheduleMode::FixedSlots);
        let mut event = press(KeyCode::Char('a'));
        event.kind = KeyEventKind::Release;
        assert_eq!(handle_key(event, &s), None);
    }
}
