//! # Bit Conversions
//!
//! Stateless helpers that turn bytes into MSB-first bit sequences and back, and
//! that read or write header text in fixed-width units.

use serde::{Deserialize, Serialize};

/// Width of one header text unit.
///
/// The depth field is exactly one unit wide, and the length field is read one
/// unit at a time until the delimiter shows up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextWidth {
    /// One byte per unit, UTF-8 text.
    #[default]
    Utf8,
    /// Two bytes per unit, big-endian UTF-16 text.
    Utf16,
}

impl TextWidth {
    /// Number of bits in one text unit.
    pub fn bits(self) -> usize {
        match self {
            TextWidth::Utf8 => 8,
            TextWidth::Utf16 => 16,
        }
    }

    /// Encodes text into bytes of this width.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextWidth::Utf8 => text.as_bytes().to_vec(),
            TextWidth::Utf16 => text
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect(),
        }
    }

    /// Decodes bytes of this width, returning `None` for invalid text.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextWidth::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            TextWidth::Utf16 => {
                if bytes.len() % 2 != 0 {
                    return None;
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).ok()
            }
        }
    }
}

/// Expands bytes into bits, most significant bit first.
pub fn bytes_to_bits(data: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(data.len() * 8);
    for &byte in data {
        for i in (0..8).rev() {
            bits.push((byte >> i) & 1 == 1);
        }
    }
    bits
}

/// Packs MSB-first bits into bytes. A trailing partial byte is zero-padded.
pub fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    let mut out = vec![0u8; bits.len().div_ceil(8)];
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            out[i / 8] |= 1 << (7 - (i % 8));
        }
    }
    out
}

pub fn text_to_bits(text: &str, width: TextWidth) -> Vec<bool> {
    bytes_to_bits(&width.encode(text))
}

/// Decodes bits as text. Fails if the bits are not whole units or not valid text.
pub fn bits_to_text(bits: &[bool], width: TextWidth) -> Option<String> {
    if bits.len() % width.bits() != 0 {
        return None;
    }
    width.decode(&bits_to_bytes(bits))
}

/// Replaces the lowest `bits.len()` bits of `value`. The first bit lands in
/// the highest of the replaced positions.
pub fn set_low_bits(value: u8, bits: &[bool]) -> u8 {
    debug_assert!(bits.len() <= 8);
    let keep = 0xFFu16 << bits.len();
    let packed = bits.iter().fold(0u16, |acc, &bit| (acc << 1) | u16::from(bit));
    ((u16::from(value) & keep) | packed) as u8
}

/// Appends the lowest `count` bits of `value` to `out`, highest first.
pub fn push_low_bits(value: u8, count: usize, out: &mut Vec<bool>) {
    debug_assert!(count <= 8);
    for i in (0..count).rev() {
        out.push((value >> i) & 1 == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_low_bits_preserves_high_bits() {
        assert_eq!(set_low_bits(0b1111_1111, &[false]), 0b1111_1110);
        assert_eq!(set_low_bits(0b1010_1010, &[true, false, true]), 0b1010_1101);
        assert_eq!(set_low_bits(0x00, &[true; 8]), 0xFF);
        assert_eq!(set_low_bits(0x5A, &[]), 0x5A);
    }

    #[test]
    fn test_push_low_bits_mirrors_set() {
        let mut out = Vec::new();
        push_low_bits(set_low_bits(0b1100_0000, &[true, false, true]), 3, &mut out);
        assert_eq!(out, vec![true, false, true]);
    }

    #[test]
    fn test_bytes_to_bits_msb_first() {
        let bits = bytes_to_bits(&[0b1000_0001, 0x00]);
        assert_eq!(bits.len(), 16);
        assert!(bits[0]);
        assert!(!bits[1]);
        assert!(bits[7]);
        assert!(bits[8..].iter().all(|b| !b));
    }

    #[test]
    fn test_bits_to_bytes_pads_partial_byte() {
        assert_eq!(bits_to_bytes(&[true, false, true]), vec![0b1010_0000]);
        assert_eq!(bits_to_bytes(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_text_units() {
        let bits = text_to_bits("3", TextWidth::Utf8);
        assert_eq!(bits.len(), 8);
        assert_eq!(bits_to_text(&bits, TextWidth::Utf8).as_deref(), Some("3"));

        let wide = text_to_bits("12:", TextWidth::Utf16);
        assert_eq!(wide.len(), 48);
        assert_eq!(bits_to_text(&wide, TextWidth::Utf16).as_deref(), Some("12:"));
    }

    #[test]
    fn test_invalid_text_is_rejected() {
        // A lone continuation byte is not UTF-8
        assert_eq!(bits_to_text(&bytes_to_bits(&[0x80]), TextWidth::Utf8), None);
        // Not a whole unit
        assert_eq!(bits_to_text(&[true; 7], TextWidth::Utf8), None);
        // Unpaired surrogate
        assert_eq!(
            bits_to_text(&bytes_to_bits(&[0xD8, 0x00]), TextWidth::Utf16),
            None
        );
    }
}
