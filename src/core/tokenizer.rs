//! The tokenizer handle: loading, encoding, decoding.
//!
//! # Pipeline
//!
//! Encoding runs in three sequential stages, with no state shared between
//! calls:
//!
//! ```text
//! text ─ special-token segmentation ─ pre-tokenizer chain ─ BPE merge ─ ids
//! ```
//!
//! Special tokens are matched as literal substrings *before* any
//! pre-tokenization (longest match wins), so `<|endoftext|>` in the input can
//! never be split apart by the regex stage. Each normal segment is fragmented
//! by the pre-tokenizer chain and each chunk is BPE-merged independently;
//! output ids are appended strictly in textual order.
//!
//! Decoding concatenates token texts and folds every code-point back through
//! the byte alphabet. Its natural output is bytes: token boundaries need not
//! align with UTF-8 character boundaries, so [`Tokenizer::decode_bytes`] is
//! the primitive and [`Tokenizer::decode`] / [`Tokenizer::decode_lossy`]
//! layer UTF-8 on top.
//!
//! A constructed [`Tokenizer`] is immutable and `Sync`; concurrent `encode` /
//! `decode` calls on a shared reference are sound because the handle holds no
//! interior mutability (in particular, no per-chunk result cache).

use std::path::Path;

use aho_corasick::{AhoCorasick, MatchKind};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use thiserror::Error;

use super::bpe::byte_pair_encode;
use super::byte_level;
use super::pre_tokenizer::{self, PreTokenizer};
use super::vocab::{MergeTable, RawTokenizer, Vocabulary};

/// Everything that can go wrong while loading or running a tokenizer.
#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("model.vocab is missing or empty")]
    VocabMissing,
    #[error("regex compilation error: {0}")]
    RegexCompile(#[from] pcre2::Error),
    #[error("token not found: {0}")]
    TokenNotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("unsupported pre-tokenizer type: {0:?}")]
    UnsupportedType(String),
    #[error("special-token matcher build error: {0}")]
    SpecialMatcher(#[from] aho_corasick::BuildError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One piece of the special-token segmentation: either a run of ordinary
/// text, or a matched special token already resolved to its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Normal(&'a [u8]),
    Special(u32),
}

/// A loaded byte-level BPE tokenizer.
pub struct Tokenizer {
    vocab: Vocabulary,
    merges: MergeTable,
    pre_tokenizers: Vec<PreTokenizer>,
    /// Leftmost-longest automaton over the special-token texts; `None` when
    /// the tokenizer has no specials.
    special_matcher: Option<AhoCorasick>,
    /// Special ids, indexed by automaton pattern id.
    special_ids: Vec<u32>,
}

impl Tokenizer {
    /// Load from the raw bytes of a `tokenizer.json` document.
    pub fn from_slice(json: &[u8]) -> Result<Self, TokenizerError> {
        let raw: RawTokenizer = serde_json::from_slice(json)?;

        let model = raw.model.ok_or(TokenizerError::VocabMissing)?;
        let mut vocab = Vocabulary::new(model.vocab.ok_or(TokenizerError::VocabMissing)?)?;
        let mut merges = MergeTable::build(&model.merges, &vocab);

        let pre_tokenizers = match &raw.pre_tokenizer {
            Some(node) => pre_tokenizer::parse_chain(node)?,
            None => Vec::new(),
        };

        for added in raw.added_tokens {
            vocab.add_special(added.content, added.id);
        }
        merges.grow(vocab.size());

        let mut patterns: Vec<&str> = Vec::with_capacity(vocab.specials().len());
        let mut special_ids = Vec::with_capacity(vocab.specials().len());
        for (token, &id) in vocab.specials() {
            patterns.push(token.as_str());
            special_ids.push(id);
        }
        let special_matcher = if patterns.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(&patterns)?,
            )
        };

        Ok(Self {
            vocab,
            merges,
            pre_tokenizers,
            special_matcher,
            special_ids,
        })
    }

    /// Load from a `tokenizer.json` string.
    pub fn from_json(json: &str) -> Result<Self, TokenizerError> {
        Self::from_slice(json.as_bytes())
    }

    /// Load from a `tokenizer.json` file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TokenizerError> {
        let data = std::fs::read(path)?;
        Self::from_slice(&data)
    }

    /// Split the input into alternating normal and special segments.
    ///
    /// The segments cover the input with no gaps and no overlaps; at every
    /// position the longest literal special-token match wins.
    pub fn split_specials<'a>(&self, text: &'a [u8]) -> Vec<Segment<'a>> {
        let Some(matcher) = &self.special_matcher else {
            return if text.is_empty() {
                Vec::new()
            } else {
                vec![Segment::Normal(text)]
            };
        };

        let mut segments = Vec::new();
        let mut last_end = 0;
        for m in matcher.find_iter(text) {
            if m.start() > last_end {
                segments.push(Segment::Normal(&text[last_end..m.start()]));
            }
            segments.push(Segment::Special(self.special_ids[m.pattern().as_usize()]));
            last_end = m.end();
        }
        if last_end < text.len() {
            segments.push(Segment::Normal(&text[last_end..]));
        }
        segments
    }

    /// Encode UTF-8 text into token ids.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        self.encode_bytes(text.as_bytes())
    }

    /// Encode raw bytes into token ids.
    ///
    /// Byte expansion covers all 256 byte values, so input that is not valid
    /// UTF-8 still encodes (the regex stage treats it as an unsplittable
    /// chunk).
    pub fn encode_bytes(&self, text: &[u8]) -> Result<Vec<u32>, TokenizerError> {
        let mut out = Vec::new();
        for segment in self.split_specials(text) {
            match segment {
                Segment::Special(id) => out.push(id),
                Segment::Normal(segment_text) => {
                    for chunk in pre_tokenizer::pre_tokenize(&self.pre_tokenizers, segment_text) {
                        byte_pair_encode(&chunk, &self.vocab, &self.merges, &mut out)?;
                    }
                }
            }
        }
        Ok(out)
    }

    /// Decode token ids back to bytes.
    ///
    /// Fails with [`InvalidInput`] on an empty id list and [`TokenNotFound`]
    /// on any id without a vocabulary entry.
    ///
    /// [`InvalidInput`]: TokenizerError::InvalidInput
    /// [`TokenNotFound`]: TokenizerError::TokenNotFound
    pub fn decode_bytes(&self, ids: &[u32]) -> Result<Vec<u8>, TokenizerError> {
        if ids.is_empty() {
            return Err(TokenizerError::InvalidInput("empty id sequence"));
        }
        let mut bytes = Vec::with_capacity(ids.len() * 4);
        for &id in ids {
            let token = self
                .vocab
                .token(id)
                .ok_or_else(|| TokenizerError::TokenNotFound(format!("id {id}")))?;
            byte_level::byte_level_decode_into(token, &mut bytes);
        }
        Ok(bytes)
    }

    /// Decode token ids to a string, failing on invalid UTF-8.
    pub fn decode(&self, ids: &[u32]) -> Result<String, TokenizerError> {
        let bytes = self.decode_bytes(ids)?;
        String::from_utf8(bytes)
            .map_err(|_| TokenizerError::InvalidInput("decoded bytes are not valid UTF-8"))
    }

    /// Decode token ids to a string, substituting U+FFFD for invalid UTF-8.
    pub fn decode_lossy(&self, ids: &[u32]) -> Result<String, TokenizerError> {
        Ok(String::from_utf8_lossy(&self.decode_bytes(ids)?).into_owned())
    }

    /// Encode a batch of texts in parallel.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<u32>>, TokenizerError> {
        texts.par_iter().map(|text| self.encode(text)).collect()
    }

    /// Decode a batch of id lists in parallel.
    pub fn decode_batch(&self, id_lists: &[Vec<u32>]) -> Result<Vec<String>, TokenizerError> {
        id_lists.par_iter().map(|ids| self.decode(ids)).collect()
    }

    /// Decode a batch of id lists in parallel, substituting invalid UTF-8.
    pub fn decode_batch_lossy(&self, id_lists: &[Vec<u32>]) -> Result<Vec<String>, TokenizerError> {
        id_lists
            .par_iter()
            .map(|ids| self.decode_lossy(ids))
            .collect()
    }

    /// The dense id range, `max_id + 1` over regular and special tokens.
    pub fn vocab_size(&self) -> usize {
        self.vocab.size()
    }

    /// The text of a token id, if any.
    pub fn token(&self, id: u32) -> Option<&str> {
        self.vocab.token(id)
    }

    /// The special-token map.
    pub fn special_tokens(&self) -> &FxHashMap<String, u32> {
        self.vocab.specials()
    }
}
