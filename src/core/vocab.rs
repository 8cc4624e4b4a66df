//! Vocabulary and merge-rule indices for the HuggingFace `tokenizer.json`
//! format.
//!
//! # Format
//!
//! The loader consumes the subset of `tokenizer.json` a byte-level BPE model
//! needs:
//!
//! ```text
//! { "model":         { "vocab":  { "<token>": <id>, ... },
//!                      "merges": [ "<L> <R>" | ["<L>", "<R>"], ... ] },
//!   "pre_tokenizer": <node> | { "type": "Sequence", "pretokenizers": [...] },
//!   "added_tokens":  [ { "content": "<string>", "id": <int>, ... }, ... ] }
//! ```
//!
//! All other keys are ignored. Merge entries come in two formats: the legacy
//! space-separated string (split at the *first* space) and the two-element
//! tuple, which exists because token text may itself contain spaces.
//!
//! # Indices
//!
//! [`Vocabulary`] keys tokens by their exact UTF-8 text (case-sensitive, no
//! normalization) and keeps a dense id-indexed reverse array. Special tokens
//! live in their own map so the encoder can match them before any
//! pre-tokenization, but they share the reverse array with regular tokens.
//!
//! [`MergeTable`] holds one row per left token id, sorted by right id, so a
//! pair lookup is an O(1) row fetch plus an O(log k) binary search. A rule
//! `(L, R) → N` is only kept when `L`, `R`, and the concatenation `LR` all
//! resolve to vocabulary ids; anything else is silently dropped, matching the
//! reference loader.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;

use super::tokenizer::TokenizerError;

/// Deserialized top level of a `tokenizer.json` document.
///
/// The stable fields are typed; the polymorphic `pre_tokenizer` subtree stays
/// a raw [`Value`] and is walked by the pre-tokenizer parser.
#[derive(Deserialize)]
pub(crate) struct RawTokenizer {
    #[serde(default)]
    pub(crate) model: Option<RawModel>,
    #[serde(default)]
    pub(crate) pre_tokenizer: Option<Value>,
    #[serde(default)]
    pub(crate) added_tokens: Vec<RawAddedToken>,
}

#[derive(Deserialize)]
pub(crate) struct RawModel {
    #[serde(default)]
    pub(crate) vocab: Option<FxHashMap<String, u32>>,
    #[serde(default)]
    pub(crate) merges: Vec<Value>,
}

#[derive(Deserialize)]
pub(crate) struct RawAddedToken {
    pub(crate) content: String,
    pub(crate) id: u32,
}

/// Token-string ↔ id index.
pub struct Vocabulary {
    /// Exact-text lookup for regular vocabulary entries.
    map: FxHashMap<String, u32>,
    /// Special tokens, matched literally before pre-tokenization.
    specials: FxHashMap<String, u32>,
    /// Dense reverse index over both maps; absent ids are `None`.
    id_to_token: Vec<Option<String>>,
}

impl Vocabulary {
    /// Build from a `model.vocab` object. Fails with [`VocabMissing`] when the
    /// map is empty.
    ///
    /// [`VocabMissing`]: TokenizerError::VocabMissing
    pub(crate) fn new(map: FxHashMap<String, u32>) -> Result<Self, TokenizerError> {
        let max_id = map
            .values()
            .copied()
            .max()
            .ok_or(TokenizerError::VocabMissing)?;
        let mut id_to_token = vec![None; max_id as usize + 1];
        for (token, &id) in &map {
            id_to_token[id as usize] = Some(token.clone());
        }
        Ok(Self {
            map,
            specials: FxHashMap::default(),
            id_to_token,
        })
    }

    /// Register an added token. Ids beyond the current range grow the reverse
    /// array; ids whose slot is already occupied are ignored, so regular
    /// vocabulary entries take precedence over `added_tokens` duplicates.
    pub(crate) fn add_special(&mut self, content: String, id: u32) {
        if id as usize >= self.id_to_token.len() {
            self.id_to_token.resize(id as usize + 1, None);
        }
        let slot = &mut self.id_to_token[id as usize];
        if slot.is_none() {
            *slot = Some(content.clone());
            self.specials.insert(content, id);
        }
    }

    /// Look up a regular token by exact text.
    #[inline]
    pub fn id_of(&self, token: &str) -> Option<u32> {
        self.map.get(token).copied()
    }

    /// The text of a token id (regular or special).
    #[inline]
    pub fn token(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(id as usize)?.as_deref()
    }

    /// Length of the dense id range, i.e. `max_id + 1` over all entries.
    #[inline]
    pub fn size(&self) -> usize {
        self.id_to_token.len()
    }

    /// The special-token map.
    #[inline]
    pub fn specials(&self) -> &FxHashMap<String, u32> {
        &self.specials
    }
}

/// One merge rule, stored in the row of its left token id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRule {
    pub right_id: u32,
    pub new_id: u32,
    /// Zero-based index of the rule in the `merges` list; lower wins.
    pub priority: u32,
}

/// Merge rules bucketed by left token id.
pub struct MergeTable {
    rows: Vec<Vec<MergeRule>>,
}

impl MergeTable {
    /// Build from the raw `model.merges` array. Every id gets a row (possibly
    /// empty) so lookups never need a bounds branch on well-formed input.
    pub(crate) fn build(merges: &[Value], vocab: &Vocabulary) -> Self {
        let mut rows: Vec<Vec<MergeRule>> = vec![Vec::new(); vocab.size()];

        for (priority, entry) in merges.iter().enumerate() {
            let Some((left, right)) = parse_merge_entry(entry) else {
                continue;
            };
            let (Some(left_id), Some(right_id)) = (vocab.id_of(left), vocab.id_of(right)) else {
                continue;
            };
            let Some(new_id) = vocab.id_of(&format!("{left}{right}")) else {
                continue;
            };
            rows[left_id as usize].push(MergeRule {
                right_id,
                new_id,
                priority: priority as u32,
            });
        }

        for row in &mut rows {
            row.sort_by_key(|rule| (rule.right_id, rule.priority));
            // Rows must be strictly ascending in right_id; a duplicated pair
            // keeps its lowest-priority rule.
            row.dedup_by_key(|rule| rule.right_id);
        }

        Self { rows }
    }

    /// Look up the rule for the adjacent pair `(left, right)`.
    #[inline]
    pub fn find(&self, left: u32, right: u32) -> Option<&MergeRule> {
        let row = self.rows.get(left as usize)?;
        row.binary_search_by_key(&right, |rule| rule.right_id)
            .ok()
            .map(|i| &row[i])
    }

    /// Extend the row array to cover ids added after the merge walk.
    pub(crate) fn grow(&mut self, size: usize) {
        if size > self.rows.len() {
            self.rows.resize_with(size, Vec::new);
        }
    }

    /// Total number of surviving rules.
    pub fn rule_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    #[cfg(test)]
    pub(crate) fn rows(&self) -> &[Vec<MergeRule>] {
        &self.rows
    }
}

/// Split a raw merge entry into its left and right token texts.
///
/// Legacy entries are `"L R"` strings split at the first space; tuple entries
/// are `["L", "R"]`. Anything else is dropped by the caller.
fn parse_merge_entry(entry: &Value) -> Option<(&str, &str)> {
    if let Some(s) = entry.as_str() {
        return s.split_once(' ');
    }
    if let Some(pair) = entry.as_array() {
        if let [left, right] = pair.as_slice() {
            return Some((left.as_str()?, right.as_str()?));
        }
    }
    None
}
