//! Terminal UI rendering.

pub mod chat_panel;
pub mod status_bar;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

/// Title shown at the top of the screen.
pub const HEADER: &str = "Morse Code Chat (Encrypted)";

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(3),    // Chat panel
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0]);
    chat_panel::render(frame, chunks[1], app);
    status_bar::render(frame, chunks[2], app);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(HEADER)
        .style(theme::bold())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}
