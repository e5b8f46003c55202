//! OOK48 constant-weight code tables.
//!
//! The alphabet is the 70 possible weight-4 bytes in ascending order; entry 0
//! carries end-of-message, entries 1..=68 the printable set, entry 69 the
//! null filler. Both directions are wire-observable and must not change.

use lazy_static::lazy_static;

/// All C(8,4) = 70 four-in-eight words, ascending.
pub const ENCODE4FROM8: [u8; 70] = [
    0x0F, 0x17, 0x1B, 0x1D, 0x1E, 0x27, 0x2B, 0x2D, 0x2E, 0x33,
    0x35, 0x36, 0x39, 0x3A, 0x3C, 0x47, 0x4B, 0x4D, 0x4E, 0x53,
    0x55, 0x56, 0x59, 0x5A, 0x5C, 0x63, 0x65, 0x66, 0x69, 0x6A,
    0x6C, 0x71, 0x72, 0x74, 0x78, 0x87, 0x8B, 0x8D, 0x8E, 0x93,
    0x95, 0x96, 0x99, 0x9A, 0x9C, 0xA3, 0xA5, 0xA6, 0xA9, 0xAA,
    0xAC, 0xB1, 0xB2, 0xB4, 0xB8, 0xC3, 0xC5, 0xC6, 0xC9, 0xCA,
    0xCC, 0xD1, 0xD2, 0xD4, 0xD8, 0xE1, 0xE2, 0xE4, 0xE8, 0xF0,
];

/// Alphabet index for end-of-message (carriage return).
pub const INDEX_CR: usize = 0;

/// Alphabet index used as the null filler.
pub const INDEX_NULL: usize = 69;

/// Character stored in the inverse table for end-of-message.
pub const DECODED_CR: u8 = 13;

/// Character stored in the inverse table for the null filler ("possible
/// null"); shared codepoint with the low-confidence marker.
pub const DECODED_NULL: u8 = 126;

lazy_static! {
    /// Inverse lookup: received byte -> decoded character. Bytes that are
    /// not valid weight-4 words map to 0.
    pub static ref DECODE4FROM8: [u8; 256] = {
        let mut table = [0u8; 256];
        for (index, &word) in ENCODE4FROM8.iter().enumerate() {
            table[word as usize] = match index {
                INDEX_CR => DECODED_CR,
                INDEX_NULL => DECODED_NULL,
                _ => index as u8 + 31,
            };
        }
        table
    };
}

/// Alphabet index for a character to transmit.
///
/// CR and LF end the message; the printable span 0x20..=0x5F maps directly;
/// lowercase folds to uppercase; everything else becomes the null filler.
pub fn char_index(ch: u8) -> usize {
    match ch {
        0x0D | 0x0A => INDEX_CR,
        0x20..=0x5F => ch as usize - 31,
        0x61..=0x7A => ch as usize - 63,
        _ => INDEX_NULL,
    }
}

/// The weight-4 word transmitted for a character.
pub fn encode_char(ch: u8) -> u8 {
    ENCODE4FROM8[char_index(ch)]
}
