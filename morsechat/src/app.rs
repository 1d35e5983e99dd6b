//! Application state and input handling for the TUI.
//!
//! [`App`] owns everything the renderer draws: the input line with its
//! cursor, the live Morse preview of that line, and the scrollback of chat
//! entries and system notices. It never touches the network; key handling
//! returns a [`NetCommand`] for the caller to dispatch, and network updates
//! come back in through [`App::apply_net_event`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use morsechat_proto::morse;

use crate::chat::ChatEntry;
use crate::net::{NetCommand, NetEvent};

/// One row of scrollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayItem {
    /// A chat entry from the session log.
    Chat(ChatEntry),
    /// A local notice (connection changes, errors).
    System(String),
}

/// Main application state.
#[derive(Debug)]
pub struct App {
    /// Current input text.
    pub input: String,
    /// Cursor position in the input, counted in characters.
    pub cursor_position: usize,
    /// Morse rendering of `input`, recomputed on every edit.
    pub morse_preview: String,
    /// Scrollback, oldest first.
    pub messages: Vec<DisplayItem>,
    /// How many items the view is scrolled back from the newest.
    pub scroll_back: usize,
    /// Whether the hub connection is up.
    pub is_connected: bool,
    /// Hub URL shown in the status bar.
    pub server_url: String,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl App {
    /// Create an empty app.
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            input: String::new(),
            cursor_position: 0,
            morse_preview: String::new(),
            messages: Vec::new(),
            scroll_back: 0,
            is_connected: false,
            server_url: server_url.into(),
            should_quit: false,
        }
    }

    /// Handle a key event.
    ///
    /// Returns `Some(NetCommand)` when the key submits a message.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<NetCommand> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                self.should_quit = true;
                None
            }
            (KeyCode::Enter, _) => self.submit_message(),
            (KeyCode::Char(c), _) => {
                self.enter_char(c);
                None
            }
            (KeyCode::Backspace, _) => {
                self.delete_char();
                None
            }
            (KeyCode::Delete, _) => {
                self.delete_char_forward();
                None
            }
            (KeyCode::Left, _) => {
                self.cursor_position = self.cursor_position.saturating_sub(1);
                None
            }
            (KeyCode::Right, _) => {
                self.cursor_position = (self.cursor_position + 1).min(self.input_len());
                None
            }
            (KeyCode::Home, _) => {
                self.cursor_position = 0;
                None
            }
            (KeyCode::End, _) => {
                self.cursor_position = self.input_len();
                None
            }
            (KeyCode::Up | KeyCode::PageUp, _) => {
                self.scroll_up();
                None
            }
            (KeyCode::Down | KeyCode::PageDown, _) => {
                self.scroll_back = self.scroll_back.saturating_sub(1);
                None
            }
            _ => None,
        }
    }

    /// Apply a networking event to the view.
    pub fn apply_net_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::MessageSent { entry } | NetEvent::MessageReceived { entry } => {
                self.push_item(DisplayItem::Chat(entry));
            }
            NetEvent::ConnectionStatus { connected } => {
                self.is_connected = connected;
                let notice = if connected {
                    format!("Connected to {}", self.server_url)
                } else {
                    "Disconnected from hub".to_string()
                };
                self.push_system_message(notice);
            }
            NetEvent::Error(msg) => self.push_system_message(msg),
        }
    }

    /// Append a system notice.
    pub fn push_system_message(&mut self, text: String) {
        self.push_item(DisplayItem::System(text));
    }

    /// Characters in the input that have no Morse encoding.
    ///
    /// Each distinct character is listed once, in first-seen order.
    #[must_use]
    pub fn unsupported_chars(&self) -> Vec<char> {
        let mut seen = Vec::new();
        for c in self.input.chars().filter(|c| !morse::is_supported(*c)) {
            if !seen.contains(&c) {
                seen.push(c);
            }
        }
        seen
    }

    fn push_item(&mut self, item: DisplayItem) {
        self.messages.push(item);
        self.scroll_back = 0;
    }

    /// Take the input as a send command. Blank input is kept as-is.
    fn submit_message(&mut self) -> Option<NetCommand> {
        if self.input.trim().is_empty() {
            return None;
        }

        let text = std::mem::take(&mut self.input);
        self.cursor_position = 0;
        self.refresh_preview();
        Some(NetCommand::SendMessage { text })
    }

    fn enter_char(&mut self, c: char) {
        let at = self.byte_index();
        self.input.insert(at, c);
        self.cursor_position += 1;
        self.refresh_preview();
    }

    fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        self.cursor_position -= 1;
        let at = self.byte_index();
        self.input.remove(at);
        self.refresh_preview();
    }

    fn delete_char_forward(&mut self) {
        if self.cursor_position >= self.input_len() {
            return;
        }
        let at = self.byte_index();
        self.input.remove(at);
        self.refresh_preview();
    }

    fn scroll_up(&mut self) {
        if self.scroll_back + 1 < self.messages.len() {
            self.scroll_back += 1;
        }
    }

    fn refresh_preview(&mut self) {
        self.morse_preview = morse::encode(&self.input);
    }

    fn input_len(&self) -> usize {
        self.input.chars().count()
    }

    /// Byte offset of the cursor in `input`.
    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map_or(self.input.len(), |(i, _)| i)
    }
}
