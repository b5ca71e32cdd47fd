//! Application state and main event loop.

use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::debug;

use crate::event::{BackendCommand, UiEvent};
use crate::state::UiState;
use crate::ui::{self, Theme};

/// Lines moved per PageUp/PageDown in the report pane.
const REPORT_PAGE: u16 = 10;

/// Main application with UI state and channel handles.
pub struct App {
    /// Current UI state snapshot for rendering.
    state: UiState,

    theme: Theme,

    /// Receiver for events from the backend.
    ui_rx: mpsc::Receiver<UiEvent>,

    /// Sender for commands to the backend.
    cmd_tx: mpsc::Sender<BackendCommand>,
}

impl App {
    pub fn new(
        origin: String,
        ui_rx: mpsc::Receiver<UiEvent>,
        cmd_tx: mpsc::Sender<BackendCommand>,
    ) -> Self {
        Self {
            state: UiState::new(origin),
            theme: Theme::default(),
            ui_rx,
            cmd_tx,
        }
    }

    /// Run the main event loop on the main thread: draw, handle keys, apply
    /// backend updates.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> std::io::Result<()> {
        loop {
            let mut report_rows = 0;
            terminal.draw(|frame| report_rows = ui::render(frame, &self.state, &self.theme))?;
            self.state.report_rows = report_rows;

            // Poll terminal events (non-blocking with short timeout)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key.code) {
                        break;
                    }
                }
            }

            while let Ok(event) = self.ui_rx.try_recv() {
                self.apply_event(event);
            }
        }

        let _ = self.cmd_tx.blocking_send(BackendCommand::Quit);

        Ok(())
    }

    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::RunUpdated(snapshot) => {
                self.state.apply_run(snapshot);
            }
            UiEvent::Error(msg) => {
                self.state.last_error = Some(msg);
            }
        }
    }

    /// Handle a key press.
    ///
    /// Returns true if the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Esc => {
                return true;
            }

            KeyCode::Enter => {
                if let Some(directive) = self.state.directive() {
                    let _ = self.cmd_tx.blocking_send(BackendCommand::Submit(directive));
                } else {
                    debug!("Deploy ignored");
                }
            }

            KeyCode::PageUp => self.state.scroll_report_up(REPORT_PAGE),
            KeyCode::PageDown => self.state.scroll_report_down(REPORT_PAGE),

            // The directive is read-only while a run is processing.
            _ if self.state.is_processing() => {}

            KeyCode::Char(c) => self.state.insert_char(c),
            KeyCode::Backspace => self.state.backspace(),
            KeyCode::Delete => self.state.delete(),
            KeyCode::Left => self.state.cursor_left(),
            KeyCode::Right => self.state.cursor_right(),
            KeyCode::Home => self.state.cursor_home(),
            KeyCode::End => self.state.cursor_end(),

            _ => {}
        }
        false
    }
}
