//! GPT-2 style configuration: a single `ByteLevel` pre-tokenizer with
//! `add_prefix_space` enabled and legacy space-separated merges.

use bytebpe::core::byte_level::byte_str;
use bytebpe::Tokenizer;
use serde_json::json;

/// Byte-singleton vocabulary (id = byte value) plus the merge ladder for
/// " hello", with the GPT-2 prefix-space policy.
fn tokenizer() -> Tokenizer {
    let mut vocab = serde_json::Map::new();
    for b in 0u16..=255 {
        vocab.insert(byte_str(b as u8).to_string(), json!(b));
    }
    vocab.insert("he".to_string(), json!(300));
    vocab.insert("hel".to_string(), json!(301));
    vocab.insert("hell".to_string(), json!(302));
    vocab.insert("hello".to_string(), json!(303));
    vocab.insert("Ġhello".to_string(), json!(304));

    let doc = json!({
        "model": {
            "vocab": vocab,
            "merges": ["h e", "he l", "hel l", "hell o", "Ġ hello"],
        },
        "pre_tokenizer": {"type": "ByteLevel", "add_prefix_space": true},
    });
    Tokenizer::from_json(&doc.to_string()).expect("fixture must load")
}

#[test]
fn test_prefix_space_changes_first_word() {
    let tok = tokenizer();
    // "hello" becomes " hello", which merges through Ġ.
    assert_eq!(tok.encode("hello").unwrap(), vec![304]);
    assert_eq!(tok.decode(&[304]).unwrap(), " hello");
}

#[test]
fn test_merge_ladder() {
    let tok = tokenizer();
    // Without the leading space, the ladder stops at "hello".
    let ids = tok.encode_bytes(b"hello").unwrap();
    assert_eq!(ids, vec![303]);
}

#[test]
fn test_empty_input() {
    let tok = tokenizer();
    assert_eq!(tok.encode("").unwrap(), Vec::<u32>::new());
    assert!(tok.decode(&[]).is_err());
}

#[test]
fn test_all_bytes_roundtrip() {
    let tok = tokenizer();
    let every_byte: Vec<u8> = (0u16..=255).map(|b| b as u8).collect();
    let ids = tok.encode_bytes(&every_byte).unwrap();
    let decoded = tok.decode_bytes(&ids).unwrap();
    // The prefix space is the only difference.
    assert_eq!(decoded[0], b' ');
    assert_eq!(&decoded[1..], every_byte.as_slice());
}

#[test]
fn test_encode_is_deterministic() {
    let tok = tokenizer();
    let text = "hello hello\nhello";
    assert_eq!(tok.encode(text).unwrap(), tok.encode(text).unwrap());
}

#[test]
fn test_decode_lossy_on_split_character() {
    let tok = tokenizer();
    // One byte of a three-byte character.
    let ids = tok.encode_bytes(&[0xE4]).unwrap();
    assert!(tok.decode(&ids).is_err());
    assert!(tok.decode_lossy(&ids).unwrap().contains('\u{FFFD}'));
}

#[test]
fn test_batch_consistency() {
    let tok = tokenizer();
    let texts = vec![
        "hello".to_string(),
        "hello hello".to_string(),
        String::new(),
    ];
    let batch = tok.encode_batch(&texts).unwrap();
    for (text, ids) in texts.iter().zip(&batch) {
        assert_eq!(ids, &tok.encode(text).unwrap());
    }

    let decoded = tok.decode_batch(&batch[..2]).unwrap();
    assert_eq!(decoded[0], " hello");
}
