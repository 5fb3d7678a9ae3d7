//! Ranked merge rules.
//!
//! A rule's rank is its position in the table: the first rule has rank 0 and
//! is applied before any other.

use std::collections::HashMap;

use tracing::debug;

use crate::error::TokenizerError;

/// Immutable `(left, right) -> rank` lookup.
#[derive(Debug, Clone, Default)]
pub struct MergeTable {
    /// Keyed left token first so lookups borrow both halves as `&str`.
    ranks: HashMap<String, HashMap<String, u32>>,
    len: usize,
}

impl MergeTable {
    /// Build from pairs in priority order. A repeated pair keeps the rank of
    /// its first occurrence.
    pub fn new<I, L, R>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        let mut ranks: HashMap<String, HashMap<String, u32>> = HashMap::new();
        let mut len = 0;
        for (rank, (left, right)) in pairs.into_iter().enumerate() {
            let (left, right) = (left.into(), right.into());
            let slot = ranks.entry(left).or_default();
            if slot.contains_key(&right) {
                debug!(rank, right = %right, "duplicate merge rule ignored");
                continue;
            }
            slot.insert(right, rank as u32);
            len += 1;
        }
        Self { ranks, len }
    }

    /// Parse `merges.txt` content: one `left right` pair per line. A leading
    /// `#version` line and blank lines are skipped.
    pub fn from_merges_text(text: &str) -> Result<Self, TokenizerError> {
        let mut pairs = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || (idx == 0 && line.starts_with("#version")) {
                continue;
            }
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(left), Some(right), None) => pairs.push((left.to_string(), right.to_string())),
                _ => {
                    return Err(TokenizerError::InvalidMerge {
                        line: idx + 1,
                        reason: format!("expected two tokens, got '{}'", line),
                    })
                }
            }
        }
        Ok(Self::new(pairs))
    }

    pub fn rank_of(&self, left: &str, right: &str) -> Option<u32> {
        self.ranks.get(left)?.get(right).copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
