//! Device identity
//!
//! Folds the 96-bit MCU unique ID into an 8-character hex serial number.
//! The result is stable for a given chip and is used for the USB serial
//! string and the `*IDN?` reply.

use heapless::String;

const NIBBLES: &[u8; 16] = b"0123456789ABCDEF";

/// Split the 12 unique-ID bytes into little-endian words
#[must_use]
pub fn uid_words(uid: &[u8; 12]) -> [u32; 3] {
    let mut words = [0u32; 3];
    for (word, chunk) in words.iter_mut().zip(uid.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

/// Xorshift fold of the unique-ID words
#[must_use]
pub const fn fold(uid: [u32; 3]) -> u32 {
    let mut serial: u32 = 0;
    let mut i = 0;
    while i < uid.len() {
        serial ^= uid[i];
        serial ^= serial << 13;
        serial ^= serial >> 17;
        serial ^= serial << 5;
        i += 1;
    }
    serial
}

/// Serial number string, least significant nibble first
#[must_use]
pub fn serial_number(uid: [u32; 3]) -> String<8> {
    let serial = fold(uid);
    let mut text = String::new();
    for i in 0..8 {
        let nibble = NIBBLES[((serial >> (i * 4)) & 0x0F) as usize];
        let _ = text.push(char::from(nibble));
    }
    text
}
