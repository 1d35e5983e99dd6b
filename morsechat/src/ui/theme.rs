//! Theme and styling constants for the TUI.

use ratatui::style::{Color, Modifier, Style};

/// Primary foreground color.
pub const FG_PRIMARY: Color = Color::White;

/// Secondary foreground color (dimmed text).
pub const FG_SECONDARY: Color = Color::Gray;

/// Highlight color for focused elements.
pub const HIGHLIGHT: Color = Color::Cyan;

/// Connected indicator color.
pub const SUCCESS: Color = Color::Green;

/// Warning color (skipped characters).
pub const WARNING: Color = Color::Yellow;

/// Disconnected indicator color.
pub const OFFLINE: Color = Color::DarkGray;

/// Morse color for messages we typed.
pub const OUTGOING: Color = Color::LightGreen;

/// Morse color for messages from the hub.
pub const INCOMING: Color = Color::LightBlue;

/// Panel title color for the chat panel.
pub const CHAT_TITLE: Color = Color::Cyan;

/// Panel title color for the live Morse bar.
pub const MORSE_TITLE: Color = Color::Green;

/// Normal text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style (the plain text under a Morse line).
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Highlighted text style (focused panel borders).
#[must_use]
pub fn highlighted() -> Style {
    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

/// Style for a Morse line in the given color.
#[must_use]
pub fn morse(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Style for system messages (italic, dim blue).
#[must_use]
pub fn system_message() -> Style {
    Style::default()
        .fg(Color::Rgb(100, 140, 180))
        .add_modifier(Modifier::ITALIC)
}

/// Style for the status bar background (dark background with white foreground).
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 50))
}

/// Style for panel titles with a given color (bold).
#[must_use]
pub fn panel_title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}
