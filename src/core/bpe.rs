//! Greedy byte-pair merging for a single pre-tokenized chunk.
//!
//! Encoding a chunk has two phases. Byte expansion maps every input byte to
//! the id of its single-code-point vocabulary entry (via the precomputed
//! alphabet spellings). Merging then repeatedly collapses the adjacent pair
//! whose rule has the lowest priority until no adjacent pair has a rule.
//!
//! Tie-breaking is part of the observable contract: when the same lowest
//! priority applies at several positions, the leftmost pair is consumed. The
//! plain rescan formulation below makes that property self-evident; fancier
//! heap/linked-list variants are only admissible if they produce bit-identical
//! output.

use super::byte_level;
use super::tokenizer::TokenizerError;
use super::vocab::{MergeTable, Vocabulary};

/// Encode one chunk, appending its ids to `out`.
pub(crate) fn byte_pair_encode(
    chunk: &[u8],
    vocab: &Vocabulary,
    merges: &MergeTable,
    out: &mut Vec<u32>,
) -> Result<(), TokenizerError> {
    if chunk.is_empty() {
        return Ok(());
    }

    // Phase A: one id per input byte.
    let mut ids = Vec::with_capacity(chunk.len());
    for &byte in chunk {
        let token = byte_level::byte_str(byte);
        let id = vocab
            .id_of(token)
            .ok_or_else(|| TokenizerError::TokenNotFound(token.to_string()))?;
        ids.push(id);
    }

    // Phase B: collapse pairs until no rule applies.
    merge_adjacent(&mut ids, merges);
    out.extend_from_slice(&ids);
    Ok(())
}

/// Apply the single best merge per round until none remains.
fn merge_adjacent(ids: &mut Vec<u32>, merges: &MergeTable) {
    while ids.len() > 1 {
        // (priority, position, new_id); strict `<` keeps the leftmost
        // position when priorities tie.
        let mut best: Option<(u32, usize, u32)> = None;
        for i in 0..ids.len() - 1 {
            if let Some(rule) = merges.find(ids[i], ids[i + 1]) {
                if best.is_none_or(|(priority, _, _)| rule.priority < priority) {
                    best = Some((rule.priority, i, rule.new_id));
                }
            }
        }
        let Some((_, i, new_id)) = best else {
            break;
        };
        ids[i] = new_id;
        ids.remove(i + 1);
    }
}
