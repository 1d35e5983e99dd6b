//! Morse codec: the bidirectional mapping between text and Morse sequences.
//!
//! The symbol table covers `A`-`Z`, `0`-`9` and space. Space maps to the
//! reserved code-word `/` so that word breaks survive inside a
//! space-delimited sequence.
//!
//! Both directions are lossy for input outside the table: unsupported
//! characters (on encode) and unknown code-words (on decode) contribute
//! nothing to the output. This means `decode(encode(x)) == x.to_uppercase()`
//! only holds when every character of `x` is supported.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Separator placed between code-words in a Morse sequence.
pub const WORD_SEPARATOR: char = ' ';

/// Code-word used for the space character.
pub const SPACE_CODE: &str = "/";

/// The fixed character to code-word table.
pub const SYMBOL_TABLE: [(char, &str); 37] = [
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    (' ', SPACE_CODE),
];

/// Inverse of [`SYMBOL_TABLE`], built on first use.
static INVERSE_TABLE: LazyLock<HashMap<&'static str, char>> = LazyLock::new(|| {
    SYMBOL_TABLE
        .iter()
        .map(|&(character, code)| (code, character))
        .collect()
});

/// Returns the code-word for a single (already uppercased) character.
#[must_use]
pub fn encode_char(character: char) -> Option<&'static str> {
    SYMBOL_TABLE
        .iter()
        .find(|(c, _)| *c == character)
        .map(|&(_, code)| code)
}

/// Returns the character for a single code-word.
#[must_use]
pub fn decode_word(code: &str) -> Option<char> {
    INVERSE_TABLE.get(code).copied()
}

/// Whether `character` survives encoding (case-insensitive).
#[must_use]
pub fn is_supported(character: char) -> bool {
    character
        .to_uppercase()
        .all(|upper| encode_char(upper).is_some())
}

/// Encodes text into a space-joined Morse sequence.
///
/// Input is uppercased first. Characters absent from the symbol table are
/// dropped without a placeholder, so `"SOS!"` encodes to `"... --- ..."`.
#[must_use]
pub fn encode(text: &str) -> String {
    let words: Vec<&str> = text
        .chars()
        .flat_map(char::to_uppercase)
        .filter_map(encode_char)
        .collect();
    words.join(" ")
}

/// Decodes a Morse sequence back into uppercase text.
///
/// Tokens are split on single spaces. Empty tokens (from leading, trailing
/// or doubled spaces) and unknown code-words contribute nothing.
#[must_use]
pub fn decode(sequence: &str) -> String {
    sequence
        .split(WORD_SEPARATOR)
        .filter_map(decode_word)
        .collect()
}
