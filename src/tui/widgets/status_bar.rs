// Status bar widget: save activity and the inline error message.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::RosterSnapshot;
use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [activity] [inline error]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let snapshot = &state.snapshot;
    let mut spans = Vec::new();

    let (activity, color) = activity_text(snapshot);
    spans.push(Span::styled(
        format!(" {activity} "),
        Style::default().fg(color),
    ));

    if let Some(ref error) = snapshot.error {
        spans.push(Span::styled("| ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            format!("Error: {error}"),
            Style::default().fg(Color::Red),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// The activity label and its color.
pub fn activity_text(snapshot: &RosterSnapshot) -> (String, Color) {
    if snapshot.loading {
        ("Loading...".to_string(), Color::Yellow)
    } else {
        let saving = snapshot.saving_rows();
        if saving > 0 {
            (format!("Saving ({saving})..."), Color::Yellow)
        } else {
            ("Ready".to_string(), Color::Green)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditState;
    use crate::protocol::RowView;

    fn snapshot_with_state(state: EditState) -> RosterSnapshot {
        RosterSnapshot {
            rows: vec![RowView {
                label: "16:00-17:00".to_string(),
                member1: String::new(),
                member2: String::new(),
                state,
                dirty: false,
            }],
            loading: false,
            ..RosterSnapshot::default()
        }
    }

    #[test]
    fn activity_shows_loading_first() {
        let snapshot = RosterSnapshot::default();
        let (text, color) = activity_text(&snapshot);
        assert_eq!(text, "Loading...");
        assert_eq!(color, Color::Yellow);
    }

    #[test]
    fn activity_counts_in_flight_saves() {
        let snapshot = snapshot_with_state(EditState::Saving);
        let (text, _) = activity_text(&snapshot);
        assert_eq!(text, "Saving (1)...");
    }

    #[test]
    fn activity_is_ready_when_idle() {
        let snapshot = snapshot_with_state(EditState::Clean);
        let (text, color) = activity_text(&snapshot);
        assert_eq!(text, "Ready");
        assert_eq!(color, Color::Green);
    }

    #[test]
    fn render_does_not_panic_with_error() {
        let backend = ratatui::backend::TestBackend::new(80, 1);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        state.snapshot.error = Some("connection refused".to_string());
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
