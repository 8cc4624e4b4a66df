//! Core tokenization engine.
//!
//! This module implements byte-level BPE inference over the HuggingFace
//! `tokenizer.json` format:
//!
//! - [`Tokenizer`]: the handle: loading, special-token segmentation,
//!   encoding, decoding, and rayon batch operations
//! - [`byte_level`]: the fixed byte ↔ code-point alphabet and its inverse
//! - [`vocab`]: vocabulary and merge-rule indices plus the JSON loader
//! - [`pre_tokenizer`]: the ByteLevel/Split chain (PCRE2 regex splitting)
//! - [`bpe`]: byte expansion and the greedy priority-ordered merge loop
//! - [`StreamingDecoder`]: UTF-8 safe token-by-token decoding for LLM output
//!
//! A loaded [`Tokenizer`] is immutable and holds no interior mutability, so a
//! shared reference can encode and decode from many threads at once.

mod bpe;
pub mod byte_level;
mod pre_tokenizer;
mod streaming;
mod tokenizer;
mod vocab;

pub use pre_tokenizer::PreTokenizer;
pub use streaming::StreamingDecoder;
pub use tokenizer::{Segment, Tokenizer, TokenizerError};
pub use vocab::{MergeRule, MergeTable, Vocabulary};
