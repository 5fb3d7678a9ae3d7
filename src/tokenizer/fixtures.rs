//! Synthetic CLIP-layout vocabulary shared by the unit tests.
//!
//! Ids follow the real CLIP layout: 256 byte characters in alphabet order,
//! the same 256 with `</w>`, then one token per merge rule, then the two
//! boundary markers. Single-byte ids therefore match the published CLIP
//! vocabulary (e.g. `a</w>` = 320).

use std::collections::HashMap;

use super::alphabet;
use super::bpe::BpeModel;
use super::clip::ClipTokenizer;
use super::merges::MergeTable;
use super::vocab::Vocabulary;
use crate::config::TokenizerConfig;

pub const MERGES: &[(&str, &str)] = &[
    ("e", "r</w>"),
    ("l", "o"),
    ("lo", "w"),
    ("low", "er</w>"),
    ("n", "e"),
    ("ne", "w"),
    ("new", "er</w>"),
    ("d", "i"),
    ("a", "g"),
    ("r", "a"),
    ("ra", "m</w>"),
    ("di", "ag"),
    ("diag", "ram</w>"),
    ("d", "o"),
    ("do", "g</w>"),
    ("c", "a"),
    ("ca", "t</w>"),
    ("-", "-</w>"),
    ("o", "o"),
    // Result deliberately left out of the vocabulary.
    ("x", "y"),
];

const NOT_IN_VOCAB: &[&str] = &["xy"];

pub const LOWER: u32 = 515;
pub const NEWER: u32 = 518;
pub const DI: u32 = 519;
pub const DIAGRAM: u32 = 524;
pub const DOG: u32 = 526;
pub const CAT: u32 = 528;
pub const DASHES: u32 = 529;
pub const OO: u32 = 530;
pub const BOS: u32 = 531;
pub const EOS: u32 = 532;

/// Id of the bare alphabet character.
pub fn byte_id(ch: char) -> u32 {
    alphabet::chars_in_vocab_order()
        .position(|c| c == ch)
        .expect("character is in the alphabet") as u32
}

/// Id of the character with the end-of-word suffix.
pub fn ending_id(ch: char) -> u32 {
    byte_id(ch) + 256
}

fn byte_tokens() -> Vec<String> {
    let mut tokens: Vec<String> = alphabet::chars_in_vocab_order()
        .map(|c| c.to_string())
        .collect();
    tokens.extend(alphabet::chars_in_vocab_order().map(|c| format!("{c}</w>")));
    tokens
}

fn tokens(merge_count: usize) -> Vec<String> {
    let mut tokens = byte_tokens();
    for (left, right) in &MERGES[..merge_count] {
        let merged = format!("{left}{right}");
        if !NOT_IN_VOCAB.contains(&merged.as_str()) {
            tokens.push(merged);
        }
    }
    tokens.push("<|startoftext|>".to_string());
    tokens.push("<|endoftext|>".to_string());
    tokens
}

pub fn vocabulary() -> Vocabulary {
    Vocabulary::from_tokens(tokens(MERGES.len())).unwrap()
}

pub fn model_with_merge_count(merge_count: usize) -> BpeModel {
    let vocab = Vocabulary::from_tokens(tokens(merge_count)).unwrap();
    BpeModel::new(vocab, MergeTable::new(MERGES[..merge_count].iter().copied()), "</w>").unwrap()
}

pub fn model() -> BpeModel {
    model_with_merge_count(MERGES.len())
}

pub fn tokenizer() -> ClipTokenizer {
    ClipTokenizer::new(
        vocabulary(),
        MergeTable::new(MERGES.iter().copied()),
        &TokenizerConfig::default(),
    )
    .unwrap()
}

/// The fixture in `vocab.json` form.
pub fn vocab_json() -> String {
    let map: HashMap<String, u32> = tokens(MERGES.len())
        .into_iter()
        .enumerate()
        .map(|(i, t)| (t, i as u32))
        .collect();
    serde_json::to_string(&map).unwrap()
}

/// The fixture in `merges.txt` form.
pub fn merges_text() -> String {
    let mut text = String::from("#version: 0.2\n");
    for (left, right) in MERGES {
        text.push_str(&format!("{left} {right}\n"));
    }
    text
}

/// Size of the released CLIP vocabulary: 512 byte tokens, 48,894 merges and
/// the two markers.
pub const CLIP_VOCAB_SIZE: usize = 49_408;

/// Merge rules at ranks whose results land on the released CLIP ids for
/// "a photo of a cat" (`id = 512 + rank`). Every other rank holds an inert
/// rule whose left side can never be formed.
const PUBLISHED_RULES: &[(usize, &str, &str)] = &[
    (27, "o", "f</w>"),
    (100, "c", "a"),
    (200, "p", "h"),
    (201, "o", "t"),
    (202, "ot", "o</w>"),
    (613, "ph", "oto</w>"),
    (1856, "ca", "t</w>"),
];

/// A tokenizer with the full CLIP id layout, markers at 49406 and 49407.
pub fn published_layout_tokenizer() -> ClipTokenizer {
    let merge_count = CLIP_VOCAB_SIZE - 512 - 2;
    let mut rules: Vec<(String, String)> = (0..merge_count)
        .map(|rank| (format!("<unused{rank}"), ">".to_string()))
        .collect();
    for &(rank, left, right) in PUBLISHED_RULES {
        rules[rank] = (left.to_string(), right.to_string());
    }

    let mut tokens = byte_tokens();
    tokens.extend(rules.iter().map(|(left, right)| format!("{left}{right}")));
    tokens.push("<|startoftext|>".to_string());
    tokens.push("<|endoftext|>".to_string());

    ClipTokenizer::new(
        Vocabulary::from_tokens(tokens).unwrap(),
        MergeTable::new(rules),
        &TokenizerConfig::default(),
    )
    .unwrap()
}
