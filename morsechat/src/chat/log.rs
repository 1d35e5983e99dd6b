//! Append-only chat history for one participant.

use morsechat_proto::frame::Frame;

/// Which way a chat entry travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Typed locally and handed to the hub.
    Outgoing,
    /// Received from the hub (this includes our own echo).
    Incoming,
}

/// One line of chat history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    /// Which way the message travelled.
    pub direction: Direction,
    /// Morse sequence carried in the frame.
    pub morse: String,
    /// Text carried in the frame. Empty for a frame without a delimiter.
    pub text: String,
}

impl ChatEntry {
    /// An outgoing entry built from the frame we sent.
    #[must_use]
    pub fn outgoing(frame: Frame) -> Self {
        Self {
            direction: Direction::Outgoing,
            morse: frame.morse,
            text: frame.text,
        }
    }

    /// An incoming entry built from a received frame.
    #[must_use]
    pub fn incoming(frame: Frame) -> Self {
        Self {
            direction: Direction::Incoming,
            morse: frame.morse,
            text: frame.text,
        }
    }

    /// Whether this entry was typed locally.
    #[must_use]
    pub fn is_outgoing(&self) -> bool {
        self.direction == Direction::Outgoing
    }
}

/// Ordered, append-only list of [`ChatEntry`] values.
///
/// Entries are never edited or removed. The log lives as long as the chat
/// session and is not persisted.
#[derive(Debug, Default, Clone)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
}

impl ChatLog {
    /// Create an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }

    /// Entries typed locally.
    pub fn outgoing(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter().filter(|e| e.direction == Direction::Outgoing)
    }

    /// Entries received from the hub.
    pub fn incoming(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter().filter(|e| e.direction == Direction::Incoming)
    }
}
