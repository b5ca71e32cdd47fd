//! UI state for rendering.

use nexus_core::RunPhase;
use unicode_width::UnicodeWidthStr;

use crate::event::RunSnapshot;

/// Snapshot of data for rendering (no async, no locks).
#[derive(Debug, Default)]
pub struct UiState {
    /// Orchestrator origin shown in the header.
    pub origin: String,

    /// Directive being edited.
    pub input: String,

    /// Cursor position in `input`, in chars.
    pub input_cursor: usize,

    /// Latest run state from the backend.
    pub run: RunSnapshot,

    /// First report row shown.
    pub report_scroll: u16,

    /// Rows the report took at the last draw, after wrapping.
    pub report_rows: usize,

    /// Last submission error (if any).
    pub last_error: Option<String>,
}

impl UiState {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    pub fn is_processing(&self) -> bool {
        self.run.state.is_processing()
    }

    /// Directive to deploy on Enter, if deploying is possible right now.
    pub fn directive(&self) -> Option<String> {
        if self.is_processing() || self.input.trim().is_empty() {
            return None;
        }
        Some(self.input.clone())
    }

    /// Replace the run snapshot.
    pub fn apply_run(&mut self, snapshot: RunSnapshot) {
        if snapshot.phase == RunPhase::Submitting {
            self.last_error = None;
        }
        if snapshot.state.final_result() != self.run.state.final_result() {
            self.report_scroll = 0;
        }
        self.run = snapshot;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = self.byte_index();
        self.input.insert(byte_idx, c);
        self.input_cursor += 1;
    }

    /// Delete the char before the cursor.
    pub fn backspace(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        self.delete();
    }

    /// Delete the char under the cursor.
    pub fn delete(&mut self) {
        if let Some((byte_idx, ch)) = self.input.char_indices().nth(self.input_cursor) {
            self.input
                .replace_range(byte_idx..byte_idx + ch.len_utf8(), "");
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.input_cursor < self.input.chars().count() {
            self.input_cursor += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input.chars().count();
    }

    pub fn scroll_report_up(&mut self, lines: u16) {
        self.report_scroll = self.report_scroll.saturating_sub(lines);
    }

    pub fn scroll_report_down(&mut self, lines: u16) {
        let max = u16::try_from(self.report_rows.saturating_sub(1)).unwrap_or(u16::MAX);
        self.report_scroll = self.report_scroll.saturating_add(lines).min(max);
    }

    /// Status message for the footer.
    pub fn status_message(&self) -> String {
        if let Some(ref error) = self.last_error {
            return format!("Error: {}", error);
        }
        match self.run.phase {
            RunPhase::Idle => "Ready".to_string(),
            RunPhase::Submitting => "Submitting...".to_string(),
            RunPhase::Streaming => match &self.run.task_id {
                Some(id) => format!("Streaming task {}", id),
                None => "Streaming".to_string(),
            },
            RunPhase::Completed | RunPhase::Failed => {
                let label = if self.run.phase == RunPhase::Completed {
                    "Completed"
                } else {
                    "Failed"
                };
                match self.run.elapsed {
                    Some(elapsed) => format!(
                        "{} in {:.1}s",
                        label,
                        elapsed.num_milliseconds() as f64 / 1000.0
                    ),
                    None => label.to_string(),
                }
            }
        }
    }

    /// Terminal cells between the start of the input and the cursor.
    pub fn cursor_column(&self) -> usize {
        self.input[..self.byte_index()].width()
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.input_cursor)
            .map_or(self.input.len(), |(idx, _)| idx)
    }
}
