//! UTF-8 safe streaming decoder for token-by-token LLM output.
//!
//! Tokens decode to byte sequences whose boundaries need not align with UTF-8
//! character boundaries: a multi-byte character can arrive split across two
//! or three tokens. This decoder buffers the folded bytes and only ever emits
//! the longest complete UTF-8 prefix, keeping the incomplete tail for the
//! next token.

use super::byte_level;
use super::tokenizer::Tokenizer;

/// A stateful decoder that assembles streamed token ids into valid UTF-8.
///
/// # Example
///
/// ```ignore
/// let tokenizer = Tokenizer::from_file("tokenizer.json")?;
/// let mut decoder = StreamingDecoder::new(&tokenizer);
///
/// for token_id in token_stream {
///     if let Some(text) = decoder.add_token(token_id) {
///         print!("{text}");
///     }
/// }
/// print!("{}", decoder.flush());
/// ```
pub struct StreamingDecoder<'a> {
    tokenizer: &'a Tokenizer,
    buffer: Vec<u8>,
}

impl<'a> StreamingDecoder<'a> {
    /// Create a streaming decoder borrowing the given tokenizer.
    pub fn new(tokenizer: &'a Tokenizer) -> Self {
        Self {
            tokenizer,
            buffer: Vec::with_capacity(16),
        }
    }

    /// Add one token and return any newly completed UTF-8 text.
    ///
    /// Unknown ids are skipped rather than reported: a streaming consumer
    /// cannot abort mid-generation. Returns `None` while the buffered bytes
    /// still end inside a multi-byte character.
    pub fn add_token(&mut self, token_id: u32) -> Option<String> {
        let token = self.tokenizer.token(token_id)?;
        byte_level::byte_level_decode_into(token, &mut self.buffer);
        self.extract_complete_utf8()
    }

    /// Add several tokens at once and return any newly completed UTF-8 text.
    pub fn add_tokens(&mut self, token_ids: &[u32]) -> Option<String> {
        for &token_id in token_ids {
            if let Some(token) = self.tokenizer.token(token_id) {
                byte_level::byte_level_decode_into(token, &mut self.buffer);
            }
        }
        self.extract_complete_utf8()
    }

    /// Drain the buffer, replacing any incomplete or invalid remainder with
    /// U+FFFD.
    pub fn flush(&mut self) -> String {
        if self.buffer.is_empty() {
            return String::new();
        }
        let result = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        result
    }

    /// Discard any buffered bytes.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Whether bytes are waiting for the rest of a character.
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Number of buffered bytes.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Split off the longest valid UTF-8 prefix of the buffer.
    fn extract_complete_utf8(&mut self) -> Option<String> {
        let valid_len = match std::str::from_utf8(&self.buffer) {
            Ok(_) => self.buffer.len(),
            Err(e) => e.valid_up_to(),
        };
        if valid_len == 0 {
            return None;
        }
        let emitted: Vec<u8> = self.buffer.drain(..valid_len).collect();
        // SAFETY: `emitted` is exactly the prefix `from_utf8` validated.
        Some(unsafe { String::from_utf8_unchecked(emitted) })
    }
}
