//! bytebpe: byte-level BPE inference for the HuggingFace `tokenizer.json`
//! format.
//!
//! The crate loads a `tokenizer.json` document into immutable in-memory
//! indices and reproduces the reference encoder's exact splits:
//!
//! - Special tokens are matched as literal substrings (longest match wins)
//!   before any other processing
//! - Normal text runs through the configured pre-tokenizer chain (`ByteLevel`
//!   prefix policy, PCRE2 `Split` patterns)
//! - Each chunk is expanded byte-by-byte through the GPT-2 style alphabet and
//!   greedily merged by rule priority, leftmost pair first on ties
//! - Decoding inverts the alphabet code-point by code-point, passing
//!   non-alphabet code-points (special-token text) through verbatim
//!
//! # Example
//!
//! ```ignore
//! use bytebpe::Tokenizer;
//!
//! let tokenizer = Tokenizer::from_file("tokenizer.json")?;
//! let ids = tokenizer.encode("Hello, world!")?;
//! assert_eq!(tokenizer.decode(&ids)?, "Hello, world!");
//! ```

pub mod core;

pub use crate::core::byte_level::{byte_level_decode, byte_level_encode};
pub use crate::core::{Segment, StreamingDecoder, Tokenizer, TokenizerError};
