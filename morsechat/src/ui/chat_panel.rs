//! Chat panel rendering (message list, live Morse bar, input box).

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::theme;
use crate::app::{App, DisplayItem};

/// Render the chat panel.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);

    render_messages(frame, chunks[0], app);
    render_morse_bar(frame, chunks[1], app);
    render_input(frame, chunks[2], app);
}

/// Lines for one scrollback item.
///
/// Outgoing entries are right-aligned, incoming ones left-aligned. The Morse
/// comes first; the text follows in parentheses when there is any.
fn item_lines(item: &DisplayItem) -> Vec<Line<'_>> {
    match item {
        DisplayItem::Chat(entry) => {
            let (alignment, color) = if entry.is_outgoing() {
                (Alignment::Right, theme::OUTGOING)
            } else {
                (Alignment::Left, theme::INCOMING)
            };
            let mut lines = vec![
                Line::from(Span::styled(entry.morse.as_str(), theme::morse(color)))
                    .alignment(alignment),
            ];
            if !entry.text.is_empty() {
                lines.push(
                    Line::from(Span::styled(format!("({})", entry.text), theme::dimmed()))
                        .alignment(alignment),
                );
            }
            lines
        }
        DisplayItem::System(text) => {
            vec![
                Line::from(Span::styled(text.as_str(), theme::system_message()))
                    .alignment(Alignment::Center),
            ]
        }
    }
}

/// Render the message list, pinned to the newest item unless scrolled back.
fn render_messages(frame: &mut Frame, area: Rect, app: &App) {
    let visible = app.messages.len().saturating_sub(app.scroll_back);
    let lines: Vec<Line> = app.messages[..visible].iter().flat_map(item_lines).collect();

    let inner_height = usize::from(area.height.saturating_sub(2));
    let offset = u16::try_from(lines.len().saturating_sub(inner_height)).unwrap_or(u16::MAX);

    let block = Block::default()
        .title(Span::styled("Chat", theme::panel_title(theme::CHAT_TITLE)))
        .borders(Borders::ALL)
        .border_style(theme::normal());

    let paragraph = Paragraph::new(lines).block(block).scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

/// Render the real-time Morse rendering of the input line.
fn render_morse_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        app.morse_preview.as_str(),
        theme::morse(theme::OUTGOING),
    )];

    let skipped = app.unsupported_chars();
    if !skipped.is_empty() {
        let list: Vec<String> = skipped.iter().map(char::to_string).collect();
        spans.push(Span::styled(
            format!("  (skipped: {})", list.join(" ")),
            theme::normal().fg(theme::WARNING),
        ));
    }

    let block = Block::default()
        .title(Span::styled("Morse", theme::panel_title(theme::MORSE_TITLE)))
        .borders(Borders::ALL);

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Render the input box.
fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let input_line = if app.input.is_empty() {
        Line::from(vec![
            Span::styled("█", theme::normal()),
            Span::styled("Type a message...", theme::dimmed()),
        ])
    } else {
        let mut display_text = String::with_capacity(app.input.len() + 3);
        for (i, c) in app.input.chars().enumerate() {
            if i == app.cursor_position {
                display_text.push('█');
            }
            display_text.push(c);
        }
        if app.cursor_position >= app.input.chars().count() {
            display_text.push('█');
        }
        Line::from(Span::styled(display_text, theme::normal()))
    };

    let block = Block::default()
        .title("Input")
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    frame.render_widget(Paragraph::new(input_line).block(block), area);
}
