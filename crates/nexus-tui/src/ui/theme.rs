//! Theme and style definitions.

use ratatui::style::{Color, Modifier, Style};

use nexus_core::RunPhase;

/// Colors used across the dashboard.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Primary accent color (title, active borders)
    pub accent: Color,
    /// Success color (completed runs)
    pub success: Color,
    /// Warning color (runs in progress)
    pub warning: Color,
    /// Error color (failed runs)
    pub error: Color,
    /// Muted color (placeholders, help text)
    pub muted: Color,
    /// Report links
    pub link: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::DarkGray,
            link: Color::Cyan,
        }
    }
}

impl Theme {
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn focused_border(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn unfocused_border(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn link_style(&self) -> Style {
        Style::default()
            .fg(self.link)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    }

    /// Color for a run phase.
    pub fn phase_style(&self, phase: RunPhase) -> Style {
        let color = match phase {
            RunPhase::Idle => self.muted,
            RunPhase::Submitting | RunPhase::Streaming => self.warning,
            RunPhase::Completed => self.success,
            RunPhase::Failed => self.error,
        };
        Style::default().fg(color)
    }
}
