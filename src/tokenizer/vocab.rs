//! Token string <-> id vocabulary.

use std::collections::HashMap;

use tracing::debug;

use super::alphabet;
use crate::error::TokenizerError;

/// Immutable token <-> id mapping with dense ids `0..len`.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    token_to_id: HashMap<String, u32>,
    id_to_token: Vec<String>,
    unk_id: Option<u32>,
}

impl Vocabulary {
    /// Build a vocabulary from a pre-parsed token -> id map.
    ///
    /// Ids must be unique and cover `0..map.len()` without gaps.
    pub fn new(token_to_id: HashMap<String, u32>) -> Result<Self, TokenizerError> {
        let mut id_to_token = vec![None; token_to_id.len()];
        for (token, &id) in &token_to_id {
            let slot = id_to_token.get_mut(id as usize).ok_or_else(|| {
                TokenizerError::InvalidVocabulary(format!(
                    "id {} of token '{}' is outside 0..{}",
                    id,
                    token,
                    token_to_id.len()
                ))
            })?;
            if let Some(prev) = slot.replace(token.clone()) {
                return Err(TokenizerError::InvalidVocabulary(format!(
                    "id {} assigned to both '{}' and '{}'",
                    id, prev, token
                )));
            }
        }
        // Every slot is filled: n distinct ids in 0..n.
        let id_to_token = id_to_token.into_iter().flatten().collect();

        Ok(Self {
            token_to_id,
            id_to_token,
            unk_id: None,
        })
    }

    /// Parse the JSON object form used by `vocab.json`.
    pub fn from_json(json: &str) -> Result<Self, TokenizerError> {
        let map: HashMap<String, u32> = serde_json::from_str(json)?;
        Self::new(map)
    }

    /// Build from tokens listed in id order.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, TokenizerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = HashMap::new();
        for (i, tok) in tokens.into_iter().enumerate() {
            let tok = tok.into();
            if map.insert(tok.clone(), i as u32).is_some() {
                return Err(TokenizerError::InvalidVocabulary(format!(
                    "duplicate token '{}'",
                    tok
                )));
            }
        }
        Self::new(map)
    }

    /// Configure the fallback id returned by [`Vocabulary::id_or_unk`].
    pub fn with_unk_token(mut self, unk: &str) -> Result<Self, TokenizerError> {
        let id = self
            .id_of(unk)
            .ok_or_else(|| TokenizerError::MissingSpecialToken(unk.to_string()))?;
        self.unk_id = Some(id);
        Ok(self)
    }

    /// Check that every alphabet character, bare and with `suffix`, has an
    /// entry. Skipped when an unknown token is configured.
    pub fn check_byte_coverage(&self, suffix: &str) -> Result<(), TokenizerError> {
        if self.unk_id.is_some() {
            debug!("unknown token configured, skipping byte coverage check");
            return Ok(());
        }
        for ch in alphabet::chars_in_vocab_order() {
            let bare = ch.to_string();
            if !self.contains(&bare) {
                return Err(TokenizerError::MissingByteToken(bare));
            }
            if !suffix.is_empty() {
                let ending = format!("{}{}", ch, suffix);
                if !self.contains(&ending) {
                    return Err(TokenizerError::MissingByteToken(ending));
                }
            }
        }
        Ok(())
    }

    pub fn id_of(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    /// Like [`Vocabulary::id_of`], falling back to the unknown id.
    pub fn id_or_unk(&self, token: &str) -> Option<u32> {
        self.id_of(token).or(self.unk_id)
    }

    /// The token string for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is outside the vocabulary. Ids handed out by this crate
    /// always come from the vocabulary itself.
    pub fn token_of(&self, id: u32) -> &str {
        &self.id_to_token[id as usize]
    }

    pub fn get_token(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(id as usize).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    pub fn unk_id(&self) -> Option<u32> {
        self.unk_id
    }

    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }
}
