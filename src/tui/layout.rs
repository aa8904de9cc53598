// Screen layout: zone arrangement and sizing.
//
// Divides the terminal area into fixed zones for the roster grid:
//
// +--------------------------------------------------+
// | Header (1 row)                                    |
// +--------------------------------------------------+
// | Roster rows (fill)                                |
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: app title and addressing mode.
    pub header: Rect,
    /// The roster grid.
    pub body: Rect,
    /// Save state and inline error message.
    pub status_bar: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(3),    // roster rows
            Constraint::Length(1), // status bar
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        header: vertical[0],
        body: vertical[1],
        status_bar: vertical[2],
        help_bar: vertical[3],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
