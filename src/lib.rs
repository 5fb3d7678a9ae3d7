pub mod cli;
pub mod config;
pub mod error;
pub mod tokenizer;

pub use config::{EncodeOptions, TokenizerConfig};
pub use error::TokenizerError;
pub use tokenizer::{encode_batch, BatchEncoding, ClipTokenizer, EncodedToken, Tokenizer};
