use ratatui::style::{Color, Modifier, Style};

use crate::app::LoginIndicator;

// Color palette
pub const PRIMARY: Color = Color::Rgb(64, 128, 192);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(192, 160, 64);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn log_line_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn border_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn login_style(indicator: LoginIndicator) -> Style {
    match indicator {
        LoginIndicator::LoggedIn => Style::default().fg(SECONDARY),
        LoginIndicator::LoggingIn => Style::default().fg(ACCENT),
        LoginIndicator::Failed => Style::default().fg(ERROR),
        LoginIndicator::LoggedOut => muted_style(),
    }
}
