//! Tokenizer construction settings and per-call encoding options.
//!
//! Both types deserialize from JSON so a host can pass them through as
//! operator attributes; missing fields take the CLIP defaults.

use serde::{Deserialize, Serialize};

/// Special-token and suffix settings used when building a tokenizer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Marker spliced before each sequence when boundary tokens are requested.
    pub bos_token: String,
    /// Marker spliced after each sequence when boundary tokens are requested.
    pub eos_token: String,
    /// Token whose id fills padding cells. `None` pads with the EOS id.
    pub pad_token: Option<String>,
    /// Fallback for pieces missing from the vocabulary.
    pub unk_token: Option<String>,
    /// Suffix attached to the last symbol of every word before merging.
    pub end_of_word_suffix: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            bos_token: "<|startoftext|>".to_string(),
            eos_token: "<|endoftext|>".to_string(),
            pad_token: None,
            unk_token: None,
            end_of_word_suffix: "</w>".to_string(),
        }
    }
}

/// Output selection and length policy for one batch call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Fixed output length. `None` pads to the longest sequence in the batch.
    pub padding_length: Option<usize>,
    pub include_attention_mask: bool,
    pub include_offsets: bool,
    /// Drop trailing tokens of sequences longer than `padding_length`
    /// instead of failing.
    pub truncate: bool,
    pub add_boundary_tokens: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            padding_length: None,
            include_attention_mask: true,
            include_offsets: true,
            truncate: true,
            add_boundary_tokens: true,
        }
    }
}

impl EncodeOptions {
    /// Set the padding length from a host integer, where any negative value
    /// (conventionally `-1`) means "pad to the longest sequence".
    pub fn with_padding_length(mut self, padding_length: i64) -> Self {
        self.padding_length = usize::try_from(padding_length).ok();
        self
    }

    pub fn ids_only(mut self) -> Self {
        self.include_attention_mask = false;
        self.include_offsets = false;
        self
    }
}
