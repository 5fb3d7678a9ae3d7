//! Normalization and word splitting ahead of BPE.
//!
//! Input is NFC-composed and lowercased for matching, while an alignment
//! table keeps, for every byte of the normalized text, the character range
//! of the original string it came from. Words are then cut with the CLIP
//! lexical pattern; whitespace is never matched, so it produces no word but
//! still advances the original offsets.

use regex::Regex;
use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::{is_nfc_quick, IsNormalized, UnicodeNormalization};

use crate::error::TokenizerError;

/// Contractions, letter runs, one numeric char, runs of everything else
/// that is not whitespace. Alternation order is the match priority.
const WORD_PATTERN: &str = r"'s|'t|'re|'ve|'m|'ll|'d|\p{L}+|\p{N}|[^\s\p{L}\p{N}]+";

/// One word produced by the pre-tokenizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordSpan {
    /// Normalized text of the word.
    pub text: String,
    /// Character offset of the first original character covered.
    pub start: usize,
    /// Character offset one past the last original character covered.
    pub end: usize,
    byte_offsets: Vec<(usize, usize)>,
}

impl WordSpan {
    /// Original-string character range for each byte of [`WordSpan::text`].
    pub fn byte_offsets(&self) -> &[(usize, usize)] {
        &self.byte_offsets
    }
}

/// Normalized text plus its per-byte alignment to the original string.
#[derive(Clone, Debug, Default)]
pub struct NormalizedText {
    pub text: String,
    pub alignments: Vec<(usize, usize)>,
}

impl NormalizedText {
    fn push_aligned(&mut self, ch: char, span: (usize, usize)) {
        for lower in ch.to_lowercase() {
            self.text.push(lower);
            self.alignments
                .extend(std::iter::repeat(span).take(lower.len_utf8()));
        }
    }

    fn push_segment(&mut self, segment: &[char], start: usize) {
        if let [ch] = segment {
            if ch.is_ascii() {
                self.push_aligned(*ch, (start, start + 1));
                return;
            }
        }
        let composed: Vec<char> = segment.iter().copied().nfc().collect();
        if composed.len() == segment.len() {
            // Unchanged, reordered or rewritten in place (singletons such as
            // U+212B); characters keep their own positions.
            for (i, ch) in composed.into_iter().enumerate() {
                self.push_aligned(ch, (start + i, start + i + 1));
            }
        } else {
            // Composition fused or split characters; the whole segment is the span.
            let span = (start, start + segment.len());
            for ch in composed {
                self.push_aligned(ch, span);
            }
        }
    }
}

/// A character NFC can never fold into whatever precedes it.
///
/// Singletons such as U+037E are `No` for the quick check yet never compose
/// backwards, so only `Maybe` keeps a starter attached.
fn is_stable_starter(ch: char) -> bool {
    canonical_combining_class(ch) == 0
        && is_nfc_quick(std::iter::once(ch)) != IsNormalized::Maybe
}

/// NFC-compose and lowercase `input`, tracking original character offsets.
pub fn normalize(input: &str) -> NormalizedText {
    let mut out = NormalizedText {
        text: String::with_capacity(input.len()),
        alignments: Vec::with_capacity(input.len()),
    };
    let mut segment: Vec<char> = Vec::new();
    let mut segment_start = 0;

    for (idx, ch) in input.chars().enumerate() {
        if is_stable_starter(ch) && !segment.is_empty() {
            out.push_segment(&segment, segment_start);
            segment.clear();
            segment_start = idx;
        }
        segment.push(ch);
    }
    if !segment.is_empty() {
        out.push_segment(&segment, segment_start);
    }
    out
}

/// Splits text into [`WordSpan`]s.
#[derive(Debug, Clone)]
pub struct PreTokenizer {
    pattern: Regex,
}

impl PreTokenizer {
    /// `special_tokens` are matched verbatim, ahead of every other rule.
    pub fn new(special_tokens: &[&str]) -> Result<Self, TokenizerError> {
        let mut alternatives: Vec<String> = special_tokens
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| regex::escape(t))
            .collect();
        alternatives.push(WORD_PATTERN.to_string());
        let pattern = Regex::new(&alternatives.join("|"))?;
        Ok(Self { pattern })
    }

    pub fn split(&self, input: &str) -> Vec<WordSpan> {
        let normalized = normalize(input);
        self.pattern
            .find_iter(&normalized.text)
            .map(|m| {
                let byte_offsets = normalized.alignments[m.start()..m.end()].to_vec();
                let start = byte_offsets.iter().map(|o| o.0).min().unwrap_or(0);
                let end = byte_offsets.iter().map(|o| o.1).max().unwrap_or(start);
                WordSpan {
                    text: m.as_str().to_string(),
                    start,
                    end,
                    byte_offsets,
                }
            })
            .collect()
    }
}
