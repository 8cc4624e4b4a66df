//! Pre-tokenization: fragmenting a text segment into chunks before BPE.
//!
//! BPE merges never cross chunk boundaries, so the pre-tokenizer chain is
//! what keeps merges from running across whitespace or punctuation. The chain
//! is an ordered list of nodes; each node is applied to every chunk of the
//! previous stage and the concatenated outputs feed the next stage.
//!
//! Two node types are supported, matching what byte-level `tokenizer.json`
//! files actually use:
//!
//! - `ByteLevel`: passes the chunk through, optionally prepending one space
//!   (`add_prefix_space`). The regexless form found in Qwen/Llama configs.
//! - `Split`: splits on a PCRE2 pattern, keeping the matched substrings as
//!   chunks of their own (the "isolated" split behavior). This is where the
//!   GPT-style long alternation patterns live, so the engine must support
//!   UTF-8 mode, Unicode classes, and lookarounds: the `pcre2` crate with
//!   `utf` and `ucp` enabled.
//!
//! Unknown node types are a load-time error: silently dropping one would
//! produce wrong encodings.

use std::borrow::Cow;

use pcre2::bytes::{Regex, RegexBuilder};
use serde_json::Value;

use super::tokenizer::TokenizerError;

/// A single pre-tokenizer node.
pub enum PreTokenizer {
    ByteLevel { add_prefix_space: bool },
    Split { regex: Regex },
}

/// Parse the `pre_tokenizer` subtree into an ordered chain.
///
/// A `Sequence` node contributes its `pretokenizers` children in order; any
/// other node forms a single-element chain. A top-level node without a `type`
/// string yields an empty chain.
pub(crate) fn parse_chain(node: &Value) -> Result<Vec<PreTokenizer>, TokenizerError> {
    let Some(node_type) = node.get("type").and_then(Value::as_str) else {
        return Ok(Vec::new());
    };
    if node_type == "Sequence" {
        let mut chain = Vec::new();
        if let Some(children) = node.get("pretokenizers").and_then(Value::as_array) {
            for child in children {
                chain.push(parse_node(child)?);
            }
        }
        Ok(chain)
    } else {
        Ok(vec![parse_node(node)?])
    }
}

fn parse_node(node: &Value) -> Result<PreTokenizer, TokenizerError> {
    let node_type = node
        .get("type")
        .and_then(Value::as_str)
        .ok_or(TokenizerError::InvalidInput("pre-tokenizer node has no type"))?;

    match node_type {
        "ByteLevel" => Ok(PreTokenizer::ByteLevel {
            add_prefix_space: node
                .get("add_prefix_space")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }),
        "Split" => {
            let pattern = node
                .get("pattern")
                .and_then(|p| p.get("Regex"))
                .and_then(Value::as_str)
                .ok_or(TokenizerError::InvalidInput(
                    "Split pre-tokenizer has no pattern.Regex",
                ))?;
            let regex = RegexBuilder::new()
                .utf(true)
                .ucp(true)
                .jit_if_available(true)
                .build(pattern)?;
            Ok(PreTokenizer::Split { regex })
        }
        other => Err(TokenizerError::UnsupportedType(other.to_string())),
    }
}

/// Run a segment through the whole chain.
///
/// Chunks borrow from the segment until a node has to own (prefix space, or
/// splitting an already-owned chunk). The byte-concatenation of the result
/// always equals the chain's input, modulo the optional prefix space.
pub(crate) fn pre_tokenize<'a>(chain: &[PreTokenizer], segment: &'a [u8]) -> Vec<Cow<'a, [u8]>> {
    let mut chunks: Vec<Cow<'a, [u8]>> = vec![Cow::Borrowed(segment)];
    for node in chain {
        let mut next = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            node.apply(chunk, &mut next);
        }
        chunks = next;
    }
    chunks
}

impl PreTokenizer {
    fn apply<'a>(&self, chunk: Cow<'a, [u8]>, out: &mut Vec<Cow<'a, [u8]>>) {
        match self {
            PreTokenizer::ByteLevel { add_prefix_space } => {
                if *add_prefix_space {
                    let mut prefixed = Vec::with_capacity(chunk.len() + 1);
                    prefixed.push(b' ');
                    prefixed.extend_from_slice(&chunk);
                    out.push(Cow::Owned(prefixed));
                } else {
                    out.push(chunk);
                }
            }
            PreTokenizer::Split { regex } => match chunk {
                Cow::Borrowed(text) => {
                    out.extend(split_keep_matches(regex, text).into_iter().map(Cow::Borrowed));
                }
                Cow::Owned(text) => {
                    out.extend(
                        split_keep_matches(regex, &text)
                            .into_iter()
                            .map(|piece| Cow::Owned(piece.to_vec())),
                    );
                }
            },
        }
    }
}

/// Split `text` on `regex`, emitting the between-match gaps *and* the matched
/// substrings, in textual order.
///
/// Empty matches advance one byte so the scan terminates. A match error (the
/// engine rejects mid-character offsets and invalid UTF-8 subjects in UTF
/// mode) ends the scan and the unmatched tail is flushed as one chunk, so no
/// input byte is ever lost.
fn split_keep_matches<'t>(regex: &Regex, text: &'t [u8]) -> Vec<&'t [u8]> {
    let mut pieces = Vec::new();
    let mut last_end = 0;
    let mut offset = 0;

    while offset < text.len() {
        let m = match regex.find_at(text, offset) {
            Ok(Some(m)) => m,
            Ok(None) | Err(_) => break,
        };
        if m.start() > last_end {
            pieces.push(&text[last_end..m.start()]);
        }
        if m.end() > m.start() {
            pieces.push(&text[m.start()..m.end()]);
            offset = m.end();
        } else {
            offset = m.end() + 1;
        }
        last_end = last_end.max(m.end());
    }

    if last_end < text.len() {
        pieces.push(&text[last_end..]);
    }
    pieces
}
