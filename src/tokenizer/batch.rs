//! Batch encoding with shared-length padding and truncation.
//!
//! Each string is encoded independently (in parallel). Once every natural
//! length is known the common length `L` is fixed, and each sequence is
//! truncated or padded to it. Padding cells hold the pad id, mask `0` and
//! offsets `(0, 0)`.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::{EncodedToken, Tokenizer};
use crate::config::EncodeOptions;
use crate::error::TokenizerError;

/// Uniform-length outputs for one batch.
///
/// `input_ids` is always present; the other two are present exactly when
/// requested in [`EncodeOptions`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchEncoding {
    pub input_ids: Vec<Vec<u32>>,
    pub attention_mask: Option<Vec<Vec<u8>>>,
    pub offset_mapping: Option<Vec<Vec<(usize, usize)>>>,
}

impl BatchEncoding {
    pub fn batch_size(&self) -> usize {
        self.input_ids.len()
    }

    /// The shared length `L` of every row.
    pub fn sequence_length(&self) -> usize {
        self.input_ids.first().map_or(0, Vec::len)
    }

    /// `input_ids` as a row-major `[batch, L]` buffer.
    pub fn flat_input_ids(&self) -> Vec<i64> {
        self.input_ids
            .iter()
            .flatten()
            .map(|&id| i64::from(id))
            .collect()
    }

    /// `attention_mask` as a row-major `[batch, L]` buffer.
    pub fn flat_attention_mask(&self) -> Option<Vec<i64>> {
        self.attention_mask
            .as_ref()
            .map(|rows| rows.iter().flatten().map(|&m| i64::from(m)).collect())
    }

    /// `offset_mapping` as a row-major `[batch, L, 2]` buffer.
    pub fn flat_offset_mapping(&self) -> Option<Vec<i64>> {
        self.offset_mapping.as_ref().map(|rows| {
            rows.iter()
                .flatten()
                .flat_map(|&(start, end)| [start as i64, end as i64])
                .collect()
        })
    }
}

/// Encode a batch of texts and bring every sequence to one length.
///
/// With `padding_length` unset the length is the longest natural sequence.
/// With it set, longer sequences are truncated when `truncate` is on
/// (keeping the closing marker if boundary tokens were added) and rejected
/// with [`TokenizerError::LengthViolation`] otherwise.
pub fn encode_batch(
    tokenizer: &dyn Tokenizer,
    texts: &[&str],
    options: &EncodeOptions,
) -> Result<BatchEncoding, TokenizerError> {
    let mut sequences = texts
        .par_iter()
        .map(|text| tokenizer.encode_sequence(text, options.add_boundary_tokens))
        .collect::<Result<Vec<_>, _>>()?;

    let length = target_length(&sequences, options)?;
    let closing = if options.add_boundary_tokens {
        tokenizer.eos_token_id()
    } else {
        None
    };
    for sequence in &mut sequences {
        truncate_sequence(sequence, length, closing);
    }

    debug!(batch_size = texts.len(), length, "batch encoded");

    let pad_id = tokenizer.pad_token_id();
    let input_ids = pad_rows(&sequences, length, pad_id, |t| t.id);
    let attention_mask = options
        .include_attention_mask
        .then(|| pad_rows(&sequences, length, 0u8, |_| 1));
    let offset_mapping = options
        .include_offsets
        .then(|| pad_rows(&sequences, length, (0, 0), EncodedToken::offsets));

    Ok(BatchEncoding {
        input_ids,
        attention_mask,
        offset_mapping,
    })
}

fn target_length(
    sequences: &[Vec<EncodedToken>],
    options: &EncodeOptions,
) -> Result<usize, TokenizerError> {
    let Some(limit) = options.padding_length else {
        return Ok(sequences.iter().map(Vec::len).max().unwrap_or(0));
    };
    if !options.truncate {
        if let Some((index, sequence)) = sequences
            .iter()
            .enumerate()
            .find(|(_, s)| s.len() > limit)
        {
            return Err(TokenizerError::LengthViolation {
                index,
                length: sequence.len(),
                limit,
            });
        }
    }
    Ok(limit)
}

/// Drop trailing tokens beyond `length`. When the sequence ends with the
/// `closing` marker and there is room for content, the marker stays last.
fn truncate_sequence(sequence: &mut Vec<EncodedToken>, length: usize, closing: Option<u32>) {
    if sequence.len() <= length {
        return;
    }
    match (closing, sequence.last().copied()) {
        (Some(closing), Some(last)) if length >= 2 && last.id == closing => {
            sequence.truncate(length - 1);
            sequence.push(last);
        }
        _ => sequence.truncate(length),
    }
}

fn pad_rows<T: Clone>(
    sequences: &[Vec<EncodedToken>],
    length: usize,
    pad: T,
    value: impl Fn(&EncodedToken) -> T,
) -> Vec<Vec<T>> {
    sequences
        .iter()
        .map(|sequence| {
            let mut row = Vec::with_capacity(length);
            row.extend(sequence.iter().map(&value));
            row.resize(length, pad.clone());
            row
        })
        .collect()
}
