//! Byte-to-unicode alphabet used by byte-level BPE.
//!
//! Every byte value maps to one printable character so that merges can run
//! over ordinary strings. Printable ASCII and most of Latin-1 map to
//! themselves; the 68 remaining bytes (controls, space, NBSP, soft hyphen)
//! map in ascending order to U+0100 onwards.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Number of bytes that map to themselves.
const SELF_MAPPED: usize = 188;

struct Tables {
    byte_to_char: [char; 256],
    char_to_byte: HashMap<char, u8>,
    /// Bytes in vocabulary order: self-mapped ranges first, then the rest.
    order: [u8; 256],
}

fn is_self_mapped(byte: u8) -> bool {
    matches!(byte, b'!'..=b'~' | 0xA1..=0xAC | 0xAE..=0xFF)
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut byte_to_char = ['\0'; 256];
        let mut order = [0u8; 256];
        let mut shifted = 0u32;
        let mut next_self = 0usize;
        let mut next_shifted = SELF_MAPPED;

        for byte in 0..=255u8 {
            if is_self_mapped(byte) {
                byte_to_char[byte as usize] = char::from(byte);
                order[next_self] = byte;
                next_self += 1;
            } else {
                // 0x100 + n stays below 0x144, always a valid scalar value.
                byte_to_char[byte as usize] = char::from_u32(0x100 + shifted).unwrap_or('\0');
                order[next_shifted] = byte;
                next_shifted += 1;
                shifted += 1;
            }
        }

        let char_to_byte = byte_to_char
            .iter()
            .enumerate()
            .map(|(b, &c)| (c, b as u8))
            .collect();

        Tables {
            byte_to_char,
            char_to_byte,
            order,
        }
    })
}

/// The character a byte maps to.
pub fn char_of(byte: u8) -> char {
    tables().byte_to_char[byte as usize]
}

/// The byte a character maps back to, if it belongs to the alphabet.
pub fn byte_of(ch: char) -> Option<u8> {
    tables().char_to_byte.get(&ch).copied()
}

/// Map raw bytes to their alphabet string, one character per byte.
pub fn encode_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char_of(b)).collect()
}

/// Inverse of [`encode_bytes`]. Returns `None` if any character is outside
/// the alphabet.
pub fn decode(text: &str) -> Option<Vec<u8>> {
    text.chars().map(byte_of).collect()
}

/// Alphabet characters in the order byte-level vocabularies list them.
pub fn chars_in_vocab_order() -> impl Iterator<Item = char> {
    tables().order.iter().map(|&b| char_of(b))
}
