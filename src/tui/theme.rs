use ratatui::style::{Color, Modifier, Style};

use crate::{models::ApplicationStatus, tui::log::LogLevel};

pub struct Theme {
    pub primary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub foreground: Color,
    pub muted: Color,
    pub border: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::LightBlue,
            foreground: Color::White,
            muted: Color::Gray,
            border: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn status(&self, status: ApplicationStatus) -> Color {
        match status {
            ApplicationStatus::Pending => self.warning,
            ApplicationStatus::Approved => self.success,
            ApplicationStatus::Rejected => self.error,
        }
    }

    pub fn log(&self, level: LogLevel) -> (&'static str, Color) {
        match level {
            LogLevel::Info => ("ℹ", self.info),
            LogLevel::Success => ("✓", self.success),
            LogLevel::Warning => ("⚠", self.warning),
            LogLevel::Error => ("✗", self.error),
        }
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn key(&self) -> Style {
        Style::default()
            .fg(self.warning)
            .add_modifier(Modifier::BOLD)
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .bg(self.border)
            .add_modifier(Modifier::BOLD)
    }
}
