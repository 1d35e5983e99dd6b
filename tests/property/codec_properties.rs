//! Property-based tests for the Morse codec and message framer.
//!
//! Uses proptest to verify:
//! 1. Any string over the supported alphabet survives encode -> decode
//!    (modulo uppercasing).
//! 2. Unsupported characters never appear in, or break, the encoded output.
//! 3. Arbitrary input never causes `decode` or `split` to panic.
//! 4. `split(combine(m, t)) == (m, t)` whenever `t` has no delimiter.

use morsechat_proto::frame::{self, DELIMITER, Frame};
use morsechat_proto::morse;
use proptest::prelude::*;

/// Strategy for strings made only of characters in the symbol table
/// (either case).
fn arb_supported_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ]{0,64}"
}

/// Strategy for arbitrary text that never contains the frame delimiter.
fn arb_text_without_delimiter() -> impl Strategy<Value = String> {
    "[^|]{0,128}"
}

proptest! {
    #[test]
    fn supported_text_round_trips_uppercased(text in arb_supported_text()) {
        let morse = morse::encode(&text);
        prop_assert_eq!(morse::decode(&morse), text.to_uppercase());
    }

    #[test]
    fn encoded_output_contains_only_morse_symbols(text in ".{0,64}") {
        let morse = morse::encode(&text);
        prop_assert!(morse.chars().all(|c| matches!(c, '.' | '-' | '/' | ' ')));
    }

    #[test]
    fn encoded_output_has_one_code_word_per_supported_char(text in ".{0,64}") {
        let supported = text
            .chars()
            .flat_map(char::to_uppercase)
            .filter(|c| morse::encode_char(*c).is_some())
            .count();
        let morse = morse::encode(&text);
        let words = if morse.is_empty() { 0 } else { morse.split(' ').count() };
        prop_assert_eq!(words, supported);
    }

    #[test]
    fn decode_never_panics(sequence in ".{0,256}") {
        let _ = morse::decode(&sequence);
    }

    #[test]
    fn decode_of_dot_dash_noise_is_supported_text(sequence in "[.\\- /]{0,128}") {
        let decoded = morse::decode(&sequence);
        prop_assert!(decoded.chars().all(morse::is_supported));
    }

    #[test]
    fn split_reverses_combine(morse in "[.\\- /]{0,64}", text in arb_text_without_delimiter()) {
        let wire = frame::combine(&morse, &text);
        prop_assert_eq!(frame::split(&wire), (morse, text));
    }

    #[test]
    fn split_without_delimiter_returns_whole_input(input in arb_text_without_delimiter()) {
        prop_assert_eq!(frame::split(&input), (input.clone(), String::new()));
    }

    #[test]
    fn frame_from_text_round_trips(text in ".{0,64}") {
        let built = Frame::from_text(&text);
        prop_assert!(!built.morse.contains(DELIMITER));
        prop_assert_eq!(Frame::parse(&built.to_wire()), built);
    }

    #[test]
    fn split_never_panics(input in ".{0,256}") {
        let (m, t) = frame::split(&input);
        if input.contains(DELIMITER) {
            prop_assert_eq!(m.len() + 1 + t.len(), input.len());
        } else {
            prop_assert_eq!(m, input);
        }
    }
}
