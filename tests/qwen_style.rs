//! Qwen/Llama style configuration: a `Sequence` pre-tokenizer with the
//! GPT-style `Split` regex followed by a regexless `ByteLevel`, tuple-format
//! merges, and no prefix space.

use bytebpe::core::byte_level::byte_str;
use bytebpe::Tokenizer;
use serde_json::json;

/// The cl100k-style alternation used by GPT/Qwen family tokenizers.
const SPLIT_PATTERN: &str = r"(?i:'s|'t|'re|'ve|'m|'ll|'d)|[^\r\n\p{L}\p{N}]?\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]+[\r\n]*|\s*[\r\n]+|\s+(?!\S)|\s+";

fn tokenizer() -> Tokenizer {
    let mut vocab = serde_json::Map::new();
    for b in 0u16..=255 {
        vocab.insert(byte_str(b as u8).to_string(), json!(b));
    }
    vocab.insert("ab".to_string(), json!(300));
    vocab.insert("Ġb".to_string(), json!(301));

    let doc = json!({
        "model": {
            "vocab": vocab,
            "merges": [["a", "b"], ["Ġ", "b"]],
        },
        "pre_tokenizer": {
            "type": "Sequence",
            "pretokenizers": [
                {"type": "Split", "pattern": {"Regex": SPLIT_PATTERN}},
                {"type": "ByteLevel", "add_prefix_space": false},
            ],
        },
    });
    Tokenizer::from_json(&doc.to_string()).expect("fixture must load")
}

#[test]
fn test_tuple_merges_apply() {
    let tok = tokenizer();
    assert_eq!(tok.encode("ab").unwrap(), vec![300]);
}

#[test]
fn test_split_blocks_cross_chunk_merge() {
    let tok = tokenizer();
    // "a b" splits into the chunks "a" and " b"; the (a, b) rule can never
    // see the pair, and " b" merges through Ġ instead.
    let ids = tok.encode("a b").unwrap();
    assert_eq!(ids, vec![b'a' as u32, 301]);
    assert!(!ids.contains(&300));
}

#[test]
fn test_roundtrip_mixed_text() {
    let tok = tokenizer();
    for text in [
        "hello world",
        "It's 2024, naïve!",
        "line one\nline two\n",
        "tabs\tand  double  spaces",
        "日本語のテキスト",
        "emoji 🌍 mix",
    ] {
        let ids = tok.encode(text).unwrap();
        assert_eq!(tok.decode(&ids).unwrap(), text, "roundtrip of {text:?}");
    }
}

#[test]
fn test_all_bytes_roundtrip_exact() {
    let tok = tokenizer();
    let every_byte: Vec<u8> = (0u16..=255).map(|b| b as u8).collect();
    let ids = tok.encode_bytes(&every_byte).unwrap();
    assert_eq!(tok.decode_bytes(&ids).unwrap(), every_byte);
}

#[test]
fn test_unsplittable_unicode_stays_bytes() {
    let tok = tokenizer();
    // No merges involve multi-byte characters, so each UTF-8 byte surfaces
    // as its own singleton id.
    let text = "世";
    let ids = tok.encode(text).unwrap();
    assert_eq!(ids.len(), text.len());
}
