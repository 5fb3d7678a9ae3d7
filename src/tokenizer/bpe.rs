//! Rank-based byte-level BPE merge engine.
//!
//! A word starts as one symbol per byte of its normalized text, each symbol
//! being that byte's alphabet character. The last symbol additionally
//! carries the end-of-word suffix (`</w>` for CLIP). The lowest-ranked
//! adjacent pair is then merged everywhere it occurs, left to right, and the
//! scan repeats until no adjacent pair has a rank.

use std::ops::Range;

use serde::Serialize;
use tracing::{debug, trace};

use super::alphabet;
use super::merges::MergeTable;
use super::pretokenize::WordSpan;
use super::vocab::Vocabulary;
use crate::error::TokenizerError;

/// A token id with the original-string character range it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct EncodedToken {
    pub id: u32,
    pub start: usize,
    pub end: usize,
}

impl EncodedToken {
    pub fn new(id: u32, start: usize, end: usize) -> Self {
        Self { id, start, end }
    }

    /// A token with no source text, such as a boundary marker.
    pub fn marker(id: u32) -> Self {
        Self::new(id, 0, 0)
    }

    pub fn offsets(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

/// One unit of a word while merging.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Symbol {
    text: String,
    start: usize,
    end: usize,
    /// Bytes of the word this symbol was built from.
    units: Range<usize>,
}

impl Symbol {
    fn merge(self, right: Symbol) -> Symbol {
        let mut text = self.text;
        text.push_str(&right.text);
        Symbol {
            text,
            start: self.start.min(right.start),
            end: self.end.max(right.end),
            units: self.units.start..right.units.end,
        }
    }
}

/// Vocabulary plus merge rules; immutable and shareable across threads.
#[derive(Debug, Clone)]
pub struct BpeModel {
    vocab: Vocabulary,
    merges: MergeTable,
    end_of_word_suffix: String,
}

impl BpeModel {
    /// Build the engine, checking that every byte-level symbol (with and
    /// without the suffix) is in the vocabulary unless an unknown token is
    /// configured.
    pub fn new(
        vocab: Vocabulary,
        merges: MergeTable,
        end_of_word_suffix: impl Into<String>,
    ) -> Result<Self, TokenizerError> {
        let end_of_word_suffix = end_of_word_suffix.into();
        vocab.check_byte_coverage(&end_of_word_suffix)?;

        debug!(
            vocab_size = vocab.len(),
            merge_count = merges.len(),
            suffix = %end_of_word_suffix,
            "BPE model initialized"
        );

        Ok(Self {
            vocab,
            merges,
            end_of_word_suffix,
        })
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn merges(&self) -> &MergeTable {
        &self.merges
    }

    pub fn end_of_word_suffix(&self) -> &str {
        &self.end_of_word_suffix
    }

    /// Encode one pre-tokenized word into ids with original offsets.
    pub fn encode_word(&self, word: &WordSpan) -> Result<Vec<EncodedToken>, TokenizerError> {
        let symbols = self.merge_symbols(self.initial_symbols(word));

        let mut output = Vec::with_capacity(symbols.len());
        for symbol in &symbols {
            match self.vocab.id_of(&symbol.text) {
                Some(id) => output.push(EncodedToken::new(id, symbol.start, symbol.end)),
                None => self.decompose(word, symbol, &mut output)?,
            }
        }
        Ok(output)
    }

    fn initial_symbols(&self, word: &WordSpan) -> Vec<Symbol> {
        let bytes = word.text.as_bytes();
        let offsets = word.byte_offsets();
        bytes
            .iter()
            .zip(offsets)
            .enumerate()
            .map(|(i, (&byte, &(start, end)))| Symbol {
                text: self.piece_text(byte, i + 1 == bytes.len()),
                start,
                end,
                units: i..i + 1,
            })
            .collect()
    }

    fn piece_text(&self, byte: u8, is_last: bool) -> String {
        let mut text = alphabet::char_of(byte).to_string();
        if is_last {
            text.push_str(&self.end_of_word_suffix);
        }
        text
    }

    fn merge_symbols(&self, mut symbols: Vec<Symbol>) -> Vec<Symbol> {
        while symbols.len() > 1 {
            let best = symbols
                .windows(2)
                .filter_map(|pair| self.merges.rank_of(&pair[0].text, &pair[1].text))
                .min();
            let Some(best) = best else {
                break;
            };

            // Ranks are unique per pair, so `best` names exactly one pair.
            let mut merged = Vec::with_capacity(symbols.len() - 1);
            let mut iter = symbols.into_iter().peekable();
            while let Some(left) = iter.next() {
                let right = iter
                    .next_if(|right| self.merges.rank_of(&left.text, &right.text) == Some(best));
                match right {
                    Some(right) => merged.push(left.merge(right)),
                    None => merged.push(left),
                }
            }
            symbols = merged;
        }
        symbols
    }

    /// Fallback for a merged symbol missing from the vocabulary: emit one
    /// token per source byte.
    fn decompose(
        &self,
        word: &WordSpan,
        symbol: &Symbol,
        output: &mut Vec<EncodedToken>,
    ) -> Result<(), TokenizerError> {
        trace!(token = %symbol.text, "symbol not in vocabulary, decomposing");
        let bytes = word.text.as_bytes();
        let offsets = word.byte_offsets();
        for unit in symbol.units.clone() {
            let piece = self.piece_text(bytes[unit], unit + 1 == bytes.len());
            let id = self
                .vocab
                .id_or_unk(&piece)
                .ok_or(TokenizerError::MissingByteToken(piece))?;
            let (start, end) = offsets[unit];
            output.push(EncodedToken::new(id, start, end));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::fixtures::{self, byte_id, ending_id};
    use crate::tokenizer::pretokenize::PreTokenizer;

    fn word(text: &str) -> WordSpan {
        let mut spans = PreTokenizer::new(&[]).unwrap().split(text);
        assert_eq!(spans.len(), 1, "fixture input must be one word");
        spans.remove(0)
    }

    fn encode(model: &BpeModel, text: &str) -> Vec<(u32, usize, usize)> {
        model
            .encode_word(&word(text))
            .unwrap()
            .into_iter()
            .map(|t| (t.id, t.start, t.end))
            .collect()
    }

    #[test]
    fn test_merges_to_single_word_token() {
        let model = fixtures::model();
        assert_eq!(encode(&model, "lower"), vec![(fixtures::LOWER, 0, 5)]);
        assert_eq!(encode(&model, "newer"), vec![(fixtures::NEWER, 0, 5)]);
        assert_eq!(encode(&model, "diagram"), vec![(fixtures::DIAGRAM, 0, 7)]);
    }

    #[test]
    fn test_single_byte_word_gets_suffix() {
        let model = fixtures::model();
        assert_eq!(encode(&model, "a"), vec![(ending_id('a'), 0, 1)]);
        assert_eq!(ending_id('a'), 320);
    }

    #[test]
    fn test_no_applicable_merge_keeps_bytes() {
        let model = fixtures::model();
        assert_eq!(
            encode(&model, "qz"),
            vec![(byte_id('q'), 0, 1), (ending_id('z'), 1, 2)]
        );
    }

    #[test]
    fn test_all_occurrences_of_best_pair_merge_left_to_right() {
        let model = fixtures::model();
        // o o o o</w>: (o, o) merges at 0-1, then (o, o</w>) has no rule.
        assert_eq!(
            encode(&model, "oooo"),
            vec![
                (fixtures::OO, 0, 2),
                (byte_id('o'), 2, 3),
                (ending_id('o'), 3, 4),
            ]
        );
        // Both pairs merge in the same pass.
        assert_eq!(
            encode(&model, "ooooo"),
            vec![(fixtures::OO, 0, 2), (fixtures::OO, 2, 4), (ending_id('o'), 4, 5)]
        );
    }

    #[test]
    fn test_partial_merge_offsets_are_contiguous() {
        let model = fixtures::model();
        // "d i" merges; "a g</w>" has no rule.
        assert_eq!(
            encode(&model, "diag"),
            vec![(fixtures::DI, 0, 2), (byte_id('a'), 2, 3), (ending_id('g'), 3, 4)]
        );
    }

    #[test]
    fn test_missing_merged_token_decomposes() {
        let model = fixtures::model();
        // "x y" is a rule but "xy" is not in the vocabulary.
        assert_eq!(
            encode(&model, "xyz"),
            vec![
                (byte_id('x'), 0, 1),
                (byte_id('y'), 1, 2),
                (ending_id('z'), 2, 3),
            ]
        );
    }

    #[test]
    fn test_multibyte_char_offsets() {
        let model = fixtures::model();
        // "é" is bytes c3 a9, both covering character 0.
        let ids = encode(&model, "É");
        assert_eq!(ids, vec![(127, 0, 1), (102 + 256, 0, 1)]);
    }

    #[test]
    fn test_decompose_uses_unk_when_configured() {
        let vocab = Vocabulary::from_tokens(["<unk>", "a", "b</w>"])
            .unwrap()
            .with_unk_token("<unk>")
            .unwrap();
        let model = BpeModel::new(vocab, MergeTable::new([("a", "b</w>")]), "</w>").unwrap();
        // "ab</w>" is missing, so it decomposes to a, b</w>.
        assert_eq!(encode(&model, "ab"), vec![(1, 0, 1), (2, 1, 2)]);
        // Nothing for "c</w>", so the unknown id stands in.
        assert_eq!(encode(&model, "c"), vec![(0, 0, 1)]);
    }

    #[test]
    fn test_missing_byte_tokens_rejected_at_construction() {
        let vocab = Vocabulary::from_tokens(["a", "a</w>"]).unwrap();
        let err = BpeModel::new(vocab, MergeTable::default(), "</w>").unwrap_err();
        assert!(matches!(err, TokenizerError::MissingByteToken(_)));
    }

    #[test]
    fn test_removing_last_rule_keeps_earlier_decisions() {
        let full = fixtures::model();
        let trimmed = fixtures::model_with_merge_count(fixtures::MERGES.len() - 1);
        for text in ["lower", "newer", "diagram", "dog", "oooo", "qz"] {
            assert_eq!(encode(&full, text), encode(&trimmed, text), "{text}");
        }
    }

    #[test]
    fn test_deterministic() {
        let model = fixtures::model();
        let first = encode(&model, "diagram");
        for _ in 0..10 {
            assert_eq!(encode(&model, "diagram"), first);
        }
    }

    #[test]
    fn test_symbol_merge_unions_offsets() {
        let left = Symbol {
            text: "ab".to_string(),
            start: 3,
            end: 5,
            units: 0..2,
        };
        let right = Symbol {
            text: "c".to_string(),
            start: 5,
            end: 6,
            units: 2..3,
        };
        let merged = left.merge(right);
        assert_eq!(merged.text, "abc");
        assert_eq!((merged.start, merged.end), (3, 6));
        assert_eq!(merged.units, 0..3);
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BpeModel>();
    }
}
