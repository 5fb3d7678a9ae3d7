//! CLIP tokenizer: pre-tokenization, BPE and offset tracking over a whole
//! input string.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use super::alphabet;
use super::bpe::{BpeModel, EncodedToken};
use super::merges::MergeTable;
use super::pretokenize::PreTokenizer;
use super::vocab::Vocabulary;
use super::Tokenizer;
use crate::config::TokenizerConfig;
use crate::error::TokenizerError;

/// Byte-level BPE tokenizer compatible with the CLIP reference tokenizer.
///
/// Immutable once built; share it by reference across threads.
#[derive(Debug, Clone)]
pub struct ClipTokenizer {
    pre_tokenizer: PreTokenizer,
    model: BpeModel,
    /// Marker strings that appear verbatim in text, mapped to their ids.
    special_tokens: HashMap<String, u32>,
    bos_id: u32,
    eos_id: u32,
    pad_id: u32,
}

impl ClipTokenizer {
    pub fn new(
        vocab: Vocabulary,
        merges: MergeTable,
        config: &TokenizerConfig,
    ) -> Result<Self, TokenizerError> {
        let vocab = match &config.unk_token {
            Some(unk) => vocab.with_unk_token(unk)?,
            None => vocab,
        };

        let special_id = |token: &str| {
            vocab
                .id_of(token)
                .ok_or_else(|| TokenizerError::MissingSpecialToken(token.to_string()))
        };
        let bos_id = special_id(config.bos_token.as_str())?;
        let eos_id = special_id(config.eos_token.as_str())?;
        let pad_id = match &config.pad_token {
            Some(pad) => special_id(pad.as_str())?,
            None => eos_id,
        };

        let special_tokens = HashMap::from([
            (config.bos_token.clone(), bos_id),
            (config.eos_token.clone(), eos_id),
        ]);
        let pre_tokenizer =
            PreTokenizer::new(&[config.bos_token.as_str(), config.eos_token.as_str()])?;
        let model = BpeModel::new(vocab, merges, config.end_of_word_suffix.clone())?;

        Ok(Self {
            pre_tokenizer,
            model,
            special_tokens,
            bos_id,
            eos_id,
            pad_id,
        })
    }

    /// Build from `vocab.json` and `merges.txt` contents.
    pub fn from_text(
        vocab_json: &str,
        merges_text: &str,
        config: &TokenizerConfig,
    ) -> Result<Self, TokenizerError> {
        let vocab = Vocabulary::from_json(vocab_json)?;
        let merges = MergeTable::from_merges_text(merges_text)?;
        Self::new(vocab, merges, config)
    }

    /// Load `vocab.json` and `merges.txt` from disk.
    pub fn from_files(
        vocab_path: impl AsRef<Path>,
        merges_path: impl AsRef<Path>,
        config: &TokenizerConfig,
    ) -> Result<Self, TokenizerError> {
        let (vocab_path, merges_path) = (vocab_path.as_ref(), merges_path.as_ref());
        info!(
            vocab = %vocab_path.display(),
            merges = %merges_path.display(),
            "Loading CLIP tokenizer"
        );
        let vocab_json = std::fs::read_to_string(vocab_path)?;
        let merges_text = std::fs::read_to_string(merges_path)?;
        let tokenizer = Self::from_text(&vocab_json, &merges_text, config)?;
        info!(
            vocab_size = tokenizer.model.vocab().len(),
            merge_count = tokenizer.model.merges().len(),
            "CLIP tokenizer loaded"
        );
        Ok(tokenizer)
    }

    /// Encode `text` without boundary markers. Tokens come out in original
    /// string order; offsets are character positions in `text`.
    pub fn encode(&self, text: &str) -> Result<Vec<EncodedToken>, TokenizerError> {
        let mut output = Vec::new();
        for word in self.pre_tokenizer.split(text) {
            if let Some(&id) = self.special_tokens.get(&word.text) {
                output.push(EncodedToken::new(id, word.start, word.end));
                continue;
            }
            output.extend(self.model.encode_word(&word)?);
        }
        Ok(output)
    }

    /// Encode `text`, optionally wrapped in the BOS/EOS markers with `(0, 0)`
    /// offsets.
    pub fn encode_with_markers(
        &self,
        text: &str,
        add_boundary_tokens: bool,
    ) -> Result<Vec<EncodedToken>, TokenizerError> {
        if !add_boundary_tokens {
            return self.encode(text);
        }
        let body = self.encode(text)?;
        let mut output = Vec::with_capacity(body.len() + 2);
        output.push(EncodedToken::marker(self.bos_id));
        output.extend(body);
        output.push(EncodedToken::marker(self.eos_id));
        Ok(output)
    }

    /// Turn ids back into text. Boundary markers are skipped and every
    /// end-of-word suffix becomes a space. A pad token that is not a marker
    /// decodes like any other token.
    pub fn decode(&self, ids: &[u32]) -> String {
        let vocab = self.model.vocab();
        let mut bytes = Vec::new();
        for &id in ids {
            if id == self.bos_id || id == self.eos_id {
                continue;
            }
            let Some(token) = vocab.get_token(id) else {
                continue;
            };
            let token = token.replace(self.model.end_of_word_suffix(), " ");
            for ch in token.chars() {
                match alphabet::byte_of(ch) {
                    Some(byte) => bytes.push(byte),
                    // Only the inserted spaces fall outside the alphabet.
                    None => {
                        let mut buf = [0u8; 4];
                        bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    }
                }
            }
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn vocab(&self) -> &Vocabulary {
        self.model.vocab()
    }

    pub fn bos_id(&self) -> u32 {
        self.bos_id
    }

    pub fn eos_id(&self) -> u32 {
        self.eos_id
    }

    pub fn pad_id(&self) -> u32 {
        self.pad_id
    }
}

impl Tokenizer for ClipTokenizer {
    fn encode_sequence(
        &self,
        text: &str,
        add_boundary_tokens: bool,
    ) -> Result<Vec<EncodedToken>, TokenizerError> {
        self.encode_with_markers(text, add_boundary_tokens)
    }

    fn decode(&self, ids: &[u32]) -> String {
        ClipTokenizer::decode(self, ids)
    }

    fn vocab_size(&self) -> usize {
        self.model.vocab().len()
    }

    fn bos_token_id(&self) -> Option<u32> {
        Some(self.bos_id)
    }

    fn eos_token_id(&self) -> Option<u32> {
        Some(self.eos_id)
    }

    fn pad_token_id(&self) -> u32 {
        self.pad_id
    }
}
