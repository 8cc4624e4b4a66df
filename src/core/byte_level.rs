//! Byte-level alphabet for BPE tokenizers.
//!
//! Byte-level BPE vocabularies never store raw bytes. Each byte is mapped to a
//! "visible" Unicode code-point first, and the vocabulary strings are spelled
//! in that alphabet (this is why a leading space shows up as `Ġ` in GPT-2
//! style vocabularies). This module owns the bijection and its inverse.
//!
//! # Mapping
//!
//! - Bytes 33..=126 (`!` to `~`): map to themselves
//! - Bytes 161..=172 (`¡` to `¬`): map to themselves
//! - Bytes 174..=255 (`®` to `ÿ`): map to themselves
//! - The remaining 68 bytes (controls, space, 127, 160, 173): map in
//!   ascending order to consecutive code-points starting at U+0100
//!
//! The inverse is a direct-indexed table of `Option<u8>`. The explicit
//! `None`/`Some` distinction matters: U+0100 legitimately inverts to byte 0,
//! so "unmapped" cannot be encoded as a zero sentinel.

use std::sync::LazyLock;

/// Size of the inverse table. Identity mappings top out at code-point 255 and
/// the remapped bytes at 256 + 67 = 323; 512 covers every produced code-point.
const INVERSE_SIZE: usize = 512;

/// Byte → code-point mapping (256 entries, one char per byte).
static BYTE_TO_CHAR: LazyLock<[char; 256]> = LazyLock::new(|| {
    let mut mapping = ['\0'; 256];
    let mut next = 256u32;
    for b in 0u16..=255 {
        let cp = match b {
            33..=126 | 161..=172 | 174..=255 => b as u32,
            _ => {
                let cp = next;
                next += 1;
                cp
            }
        };
        // Every produced code-point is below the surrogate range.
        mapping[b as usize] = char::from_u32(cp).unwrap();
    }
    mapping
});

/// Code-point → byte inverse, direct-indexed.
static CODEPOINT_TO_BYTE: LazyLock<[Option<u8>; INVERSE_SIZE]> = LazyLock::new(|| {
    let mut inverse = [None; INVERSE_SIZE];
    for (byte, &ch) in BYTE_TO_CHAR.iter().enumerate() {
        inverse[ch as usize] = Some(byte as u8);
    }
    inverse
});

/// Precomputed UTF-8 spellings of every byte's code-point. Byte expansion
/// looks these up in the vocabulary once per input byte, so they are encoded
/// exactly once.
static BYTE_STRS: LazyLock<[String; 256]> =
    LazyLock::new(|| std::array::from_fn(|b| BYTE_TO_CHAR[b].to_string()));

/// The alphabet code-point for a byte.
#[inline]
pub fn byte_to_char(byte: u8) -> char {
    BYTE_TO_CHAR[byte as usize]
}

/// The UTF-8 spelling of a byte's code-point, as stored in vocabularies.
#[inline]
pub fn byte_str(byte: u8) -> &'static str {
    BYTE_STRS[byte as usize].as_str()
}

/// The byte a code-point inverts to, if the code-point is in the alphabet.
#[inline]
pub fn codepoint_to_byte(cp: u32) -> Option<u8> {
    if (cp as usize) < INVERSE_SIZE {
        CODEPOINT_TO_BYTE[cp as usize]
    } else {
        None
    }
}

/// Spell a byte sequence in the visible alphabet.
///
/// This is how vocabulary keys are produced from raw text, e.g.
/// `byte_level_encode(b" hello")` is `"Ġhello"`.
#[inline]
pub fn byte_level_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| BYTE_TO_CHAR[b as usize]).collect()
}

/// Fold an alphabet-spelled string back to bytes, appending to `out`.
///
/// Code-points inside the alphabet become their byte; anything else is copied
/// as its literal UTF-8. Special-token text such as `<|endoftext|>` is ASCII
/// and folds through the identity range unchanged.
pub fn byte_level_decode_into(text: &str, out: &mut Vec<u8>) {
    for ch in text.chars() {
        match codepoint_to_byte(ch as u32) {
            Some(byte) => out.push(byte),
            None => out.extend_from_slice(ch.encode_utf8(&mut [0u8; 4]).as_bytes()),
        }
    }
}

/// Fold an alphabet-spelled string back to bytes.
#[inline]
pub fn byte_level_decode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    byte_level_decode_into(text, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_is_bijective() {
        let mut seen = std::collections::HashSet::new();
        for b in 0u16..=255 {
            let ch = byte_to_char(b as u8);
            assert!(seen.insert(ch), "duplicate mapping for byte {b:#x}");
        }
        assert_eq!(seen.len(), 256);
    }

    #[test]
    fn test_inverse_roundtrip_all_bytes() {
        for b in 0u16..=255 {
            let ch = byte_to_char(b as u8);
            assert_eq!(codepoint_to_byte(ch as u32), Some(b as u8));
        }
    }

    #[test]
    fn test_byte_zero_is_defined() {
        // Byte 0 remaps to U+0100; a zero-sentinel inverse would lose it.
        assert_eq!(byte_to_char(0), '\u{100}');
        assert_eq!(codepoint_to_byte(0x100), Some(0));
    }

    #[test]
    fn test_space_maps_to_g_with_dot() {
        assert_eq!(byte_to_char(32), 'Ġ');
        assert_eq!(byte_str(32), "Ġ");
    }

    #[test]
    fn test_printable_ascii_preserved() {
        for b in 33u8..=126 {
            assert_eq!(byte_to_char(b) as u32, b as u32);
        }
    }

    #[test]
    fn test_encode_with_space() {
        assert_eq!(byte_level_encode(b" hello"), "Ġhello");
    }

    #[test]
    fn test_decode_folds_alphabet() {
        assert_eq!(byte_level_decode("Ġhello"), b" hello");
    }

    #[test]
    fn test_decode_passes_through_foreign_codepoints() {
        // "世" (U+4E16) is outside the alphabet and must survive verbatim.
        let mut out = Vec::new();
        byte_level_decode_into("a世b", &mut out);
        assert_eq!(out, "a世b".as_bytes());
    }

    #[test]
    fn test_special_token_text_is_fixed_point() {
        assert_eq!(byte_level_decode("<|endoftext|>"), b"<|endoftext|>");
    }

    #[test]
    fn test_full_roundtrip_multibyte() {
        let original = "Hello, 世界! 🌍";
        let spelled = byte_level_encode(original.as_bytes());
        assert_eq!(byte_level_decode(&spelled), original.as_bytes());
    }
}
