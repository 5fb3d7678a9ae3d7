//! Tokenizer trait and the byte-level BPE pipeline behind it.
//!
//! This module defines the [`Tokenizer`] trait implemented by
//! [`ClipTokenizer`], and the batch driver [`encode_batch`] that pads or
//! truncates a batch of encodings to one shared length.

pub mod alphabet;
pub mod batch;
pub mod bpe;
pub mod clip;
pub mod merges;
pub mod pretokenize;
pub mod vocab;

#[cfg(test)]
pub(crate) mod fixtures;

pub use batch::{encode_batch, BatchEncoding};
pub use bpe::{BpeModel, EncodedToken};
pub use clip::ClipTokenizer;
pub use merges::MergeTable;
pub use pretokenize::{PreTokenizer, WordSpan};
pub use vocab::Vocabulary;

use crate::error::TokenizerError;

/// A tokenizer that converts text to offset-tagged token ids and back.
///
/// All implementations must be thread-safe (`Send + Sync`); the batch driver
/// encodes strings concurrently through a shared reference.
pub trait Tokenizer: Send + Sync {
    /// Encode text into token ids with original-string character offsets.
    ///
    /// When `add_boundary_tokens` is true the sequence is wrapped in the
    /// implementation's begin/end markers, which carry `(0, 0)` offsets.
    fn encode_sequence(
        &self,
        text: &str,
        add_boundary_tokens: bool,
    ) -> Result<Vec<EncodedToken>, TokenizerError>;

    /// Decode a sequence of token IDs back into text.
    fn decode(&self, ids: &[u32]) -> String;

    /// Return the total vocabulary size.
    fn vocab_size(&self) -> usize;

    /// Beginning-of-sequence marker id, if applicable.
    fn bos_token_id(&self) -> Option<u32>;

    /// End-of-sequence marker id, if applicable.
    fn eos_token_id(&self) -> Option<u32>;

    /// Id written into padding cells.
    fn pad_token_id(&self) -> u32;
}
