// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` holding the latest `RosterSnapshot` pushed by
// the orchestrator over an mpsc channel; it translates keystrokes into
// `UserCommand`s and re-renders at ~30 fps. All roster logic lives on the
// orchestrator side; this module only draws and forwards.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::config::ScheduleMode;
use crate::protocol::{RosterSnapshot, UserCommand};

use layout::build_layout;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// The TUI's mirror of the application state.
#[derive(Debug, Default)]
pub struct ViewState {
    pub snapshot: RosterSnapshot,
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop until the user quits.
pub async fn run(
    mut ui_rx: mpsc::Receiver<RosterSnapshot>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    // 1. Initialize terminal
    let mut terminal = ratatui::init();

    // 2. Set panic hook to restore terminal on crash.
    //    We capture the original hook and chain ours before it.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    // 3. View state and async keyboard input
    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    // 4. Render interval (~30fps)
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // 5. Main loop
    loop {
        tokio::select! {
            // Snapshots from the orchestrator
            snapshot = ui_rx.recv() => {
                match snapshot {
                    Some(snapshot) => view_state.snapshot = snapshot,
                    None => {
                        // Channel closed: app is shutting down
                        break;
                    }
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(command) = input::handle_key(key_event, &view_state) {
                            let quit = command == UserCommand::Quit;
                            let _ = cmd_tx.send(command).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse events, resize events, etc. -- ignore
                    }
                    Some(Err(_)) | None => {
                        break;
                    }
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    // 6. Restore terminal
    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Draw one frame from the current view state.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let app_layout = build_layout(frame.area());

    render_header(frame, app_layout.header, state);
    widgets::roster::render(frame, app_layout.body, state);
    widgets::status_bar::render(frame, app_layout.status_bar, state);
    render_help(frame, app_layout.help_bar, state);
}

fn render_header(frame: &mut Frame, area: ratatui::layout::Rect, state: &ViewState) {
    let mode = match state.snapshot.mode {
        ScheduleMode::FixedSlots => "hour slots",
        ScheduleMode::FreeOrder => "team list",
    };
    let line = Line::from(vec![
        Span::styled(
            " Barvagt ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {mode}"), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_help(frame: &mut Frame, area: ratatui::layout::Rect, state: &ViewState) {
    let text = help_text(state.snapshot.mode);
    let paragraph = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

/// Keyboard hints for the bottom bar, per addressing mode.
pub fn help_text(mode: ScheduleMode) -> &'static str {
    match mode {
        ScheduleMode::FixedSlots => {
            " ↑/↓ slot | Tab field | Enter save | ^K clear | ^R reload | Esc quit"
        }
        ScheduleMode::FreeOrder => {
            " ↑/↓ team | ^↑/^↓ move | Tab field | Enter save | ^N add | ^D delete | ^R reload | Esc quit"
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
