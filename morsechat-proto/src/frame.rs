//! Message framing: joining a Morse sequence and its source text into the
//! single string that gets encrypted and transmitted.
//!
//! Wire form: `<morse>|<text>`.
//!
//! The delimiter is not escaped. Morse sequences never contain it, so the
//! first `|` always ends the Morse part; any further `|` stays in the text.
//! A frame with no delimiter at all parses as `(frame, "")` instead of
//! failing, so malformed payloads degrade rather than fault.

use crate::morse;

/// Separator between the Morse part and the text part of a frame.
pub const DELIMITER: char = '|';

/// Joins a Morse sequence and plain text into a wire frame.
#[must_use]
pub fn combine(morse: &str, text: &str) -> String {
    let mut frame = String::with_capacity(morse.len() + 1 + text.len());
    frame.push_str(morse);
    frame.push(DELIMITER);
    frame.push_str(text);
    frame
}

/// Splits a wire frame on the first delimiter.
///
/// Returns `(frame, "")` when no delimiter is present.
#[must_use]
pub fn split(frame: &str) -> (String, String) {
    match frame.split_once(DELIMITER) {
        Some((morse, text)) => (morse.to_string(), text.to_string()),
        None => (frame.to_string(), String::new()),
    }
}

/// A decoded frame: the Morse rendering alongside the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Space-joined Morse sequence.
    pub morse: String,
    /// The original text as typed by the sender.
    pub text: String,
}

impl Frame {
    /// Builds a frame from text, encoding the Morse part.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            morse: morse::encode(text),
            text: text.to_string(),
        }
    }

    /// Parses a wire frame (see [`split`]).
    #[must_use]
    pub fn parse(wire: &str) -> Self {
        let (morse, text) = split(wire);
        Self { morse, text }
    }

    /// Serializes this frame to its wire form (see [`combine`]).
    #[must_use]
    pub fn to_wire(&self) -> String {
        combine(&self.morse, &self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_joins_with_delimiter() {
        assert_eq!(combine("... --- ...", "SOS"), "... --- ...|SOS");
    }

    #[test]
    fn split_reverses_combine() {
        let (m, t) = split(&combine("... --- ...", "sos"));
        assert_eq!(m, "... --- ...");
        assert_eq!(t, "sos");
    }

    #[test]
    fn split_without_delimiter_falls_back() {
        assert_eq!(split("NOSPLIT"), ("NOSPLIT".to_string(), String::new()));
    }

    #[test]
    fn split_empty_frame() {
        assert_eq!(split(""), (String::new(), String::new()));
    }

    #[test]
    fn split_on_first_delimiter_only() {
        let (m, t) = split(".-|a|b");
        assert_eq!(m, ".-");
        assert_eq!(t, "a|b");
    }

    #[test]
    fn empty_parts_survive() {
        assert_eq!(split("|"), (String::new(), String::new()));
        assert_eq!(split("|hi"), (String::new(), "hi".to_string()));
        assert_eq!(split(".-|"), (".-".to_string(), String::new()));
    }

    #[test]
    fn frame_from_text_encodes_morse() {
        let frame = Frame::from_text("SOS");
        assert_eq!(frame.morse, "... --- ...");
        assert_eq!(frame.text, "SOS");
        assert_eq!(frame.to_wire(), "... --- ...|SOS");
    }

    #[test]
    fn frame_parse_round_trip_with_pipe_in_text() {
        let frame = Frame::from_text("a|b");
        assert!(!frame.morse.contains(DELIMITER));
        assert_eq!(Frame::parse(&frame.to_wire()), frame);
    }

    #[test]
    fn frame_keeps_original_case() {
        let frame = Frame::from_text("Hello there");
        assert_eq!(frame.text, "Hello there");
        assert_eq!(frame.morse, ".... . .-.. .-.. --- / - .... . .-. .");
    }
}
