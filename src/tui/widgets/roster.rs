// Roster grid widget: one line per slot or team.
//
// "16:00-17:00  [Alice          ] & [Bob            ]"
// The focused row is highlighted, its active field brightened, and a
// trailing marker shows unsaved/in-flight state.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::config::ScheduleMode;
use crate::editor::{EditState, Field};
use crate::protocol::RowView;
use crate::tui::ViewState;

/// Width of a rendered name field.
const FIELD_WIDTH: usize = 16;

/// Render the roster grid into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let snapshot = &state.snapshot;

    if snapshot.rows.is_empty() {
        let hint = if snapshot.loading {
            "  Loading roster..."
        } else if snapshot.mode == ScheduleMode::FreeOrder {
            "  No teams yet. Press ^N to add one."
        } else {
            "  No slots configured."
        };
        let paragraph = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Roster"));
        frame.render_widget(paragraph, area);
        return;
    }

    // Visible row count: subtract 2 for borders
    let visible_rows = (area.height as usize).saturating_sub(2).max(1);
    let total = snapshot.rows.len();

    // Keep the focused row on screen.
    let scroll_offset = snapshot
        .selected
        .saturating_sub(visible_rows.saturating_sub(1))
        .min(total.saturating_sub(visible_rows));

    let items: Vec<ListItem> = snapshot
        .rows
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_rows)
        .map(|(index, row)| {
            format_row(
                row,
                index == snapshot.selected,
                snapshot.active_field,
            )
        })
        .collect();

    let staffed = snapshot
        .rows
        .iter()
        .filter(|r| !(r.member1.is_empty() && r.member2.is_empty()))
        .count();
    let title = format!("Roster ({staffed}/{total} staffed)");

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

/// Format a single roster row as a ListItem.
fn format_row<'a>(row: &RowView, selected: bool, active_field: Field) -> ListItem<'a> {
    let label_style = if selected {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let mut spans = vec![
        Span::styled(if selected { ">" } else { " " }, label_style),
        Span::styled(format!(" {:<12} ", row.label), label_style),
        field_span(&row.member1, selected && active_field == Field::Member1),
        Span::styled(" & ", Style::default().fg(Color::DarkGray)),
        field_span(&row.member2, selected && active_field == Field::Member2),
    ];

    spans.push(Span::styled(
        state_marker(row),
        Style::default().fg(Color::Yellow),
    ));

    ListItem::new(Line::from(spans))
}

fn field_span(value: &str, active: bool) -> Span<'static> {
    let text = format!("[{:<width$}]", truncated(value), width = FIELD_WIDTH);
    let style = if active {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::Gray)
    };
    Span::styled(text, style)
}

/// Keep the tail of an overlong name visible, which is where the user is
/// typing.
fn truncated(value: &str) -> String {
    let count = value.chars().count();
    if count <= FIELD_WIDTH {
        value.to_string()
    } else {
        value.chars().skip(count - FIELD_WIDTH).collect()
    }
}

/// Trailing save-state marker for a row.
pub fn state_marker(row: &RowView) -> &'static str {
    match row.state {
        EditState::Saving => " ...",
        EditState::Editing if row.dirty => " *",
        _ => "",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RosterSnapshot;

    fn row(state: EditState, dirty: bool) -> RowView {
        RowView {
            label: "16:00-17:00".to_string(),
            member1: "Alice".to_string(),
            member2: String::new(),
            state,
            dirty,
        }
    }

    #[test]
    fn state_marker_reflects_row_state() {
        assert_eq!(state_marker(&row(EditState::Clean, false)), "");
        assert_eq!(state_marker(&row(EditState::Editing, true)), " *");
        assert_eq!(state_marker(&row(EditState::Saving, true)), " ...");
    }

    #[test]
    fn truncated_keeps_the_tail() {
        assert_eq!(truncated("Alice"), "Alice");
        let long = "Annelise Kristoffersen";
        let shown = truncated(long);
        assert_eq!(shown.chars().count(), FIELD_WIDTH);
        assert!(long.ends_with(&shown));
    }

    #[test]
    fn render_does_not_panic_empty() {
        let backend = ratatui::backend::TestBackend::new(60, 10);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }

    #[test]
    fn render_does_not_panic_with_more_rows_than_space() {
        let backend = ratatui::backend::TestBackend::new(60, 6);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let rows: Vec<RowView> = (0..12).map(|_| row(EditState::Clean, false)).collect();
        let state = ViewState {
            snapshot: RosterSnapshot {
                rows,
                selected: 11,
                loading: false,
                ..RosterSnapshot::default()
            },
        };
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
