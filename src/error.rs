use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid vocabulary: {0}")]
    InvalidVocabulary(String),

    #[error("Invalid merge rule at line {line}: {reason}")]
    InvalidMerge { line: usize, reason: String },

    #[error("Vocabulary has no entry for byte-level token '{0}'")]
    MissingByteToken(String),

    #[error("Special token not in vocabulary: {0}")]
    MissingSpecialToken(String),

    #[error("Invalid pre-tokenizer pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Sequence {index} has {length} tokens, exceeding padding length {limit} with truncation disabled")]
    LengthViolation {
        index: usize,
        length: usize,
        limit: usize,
    },
}
