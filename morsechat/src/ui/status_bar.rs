//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::App;

const HELP_TEXT: &str = "Enter: send | ↑↓: scroll | ←→: move cursor | Esc: quit";

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let (dot_color, status_text) = if app.is_connected {
        (theme::SUCCESS, format!("Connected to {}", app.server_url))
    } else {
        (theme::OFFLINE, "Offline".to_string())
    };

    let status_line = Line::from(vec![
        Span::styled(concat!("MorseChat v", env!("CARGO_PKG_VERSION")), theme::bold()),
        Span::raw(" | "),
        Span::styled("●", theme::normal().fg(dot_color)),
        Span::raw(format!(" {status_text}")),
        Span::raw(" | "),
        Span::styled(HELP_TEXT, theme::dimmed()),
    ]);

    let paragraph = Paragraph::new(status_line).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
