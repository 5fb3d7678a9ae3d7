//! cliptok: Tokenize text with a CLIP `vocab.json` / `merges.txt` pair.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use serde::Serialize;

use cliptok::cli;
use cliptok::config::{EncodeOptions, TokenizerConfig};
use cliptok::tokenizer::{encode_batch, BatchEncoding, ClipTokenizer};

#[derive(Parser)]
#[command(name = "cliptok", about = "Tokenize text with a CLIP byte-level BPE vocabulary")]
struct Args {
    /// Path to vocab.json (token -> id)
    #[arg(long)]
    vocab: PathBuf,

    /// Path to merges.txt (one "left right" pair per line)
    #[arg(long)]
    merges: PathBuf,

    /// Text to tokenize; repeat for a batch
    #[arg(short = 'p', long, conflicts_with_all = ["file", "stdin"])]
    prompt: Vec<String>,

    /// Read one input per line from file
    #[arg(short = 'f', long, conflicts_with = "stdin")]
    file: Option<PathBuf>,

    /// Read one input per line from stdin
    #[arg(long)]
    stdin: bool,

    /// Fixed output length; negative pads to the longest input
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    padding_length: i64,

    /// Fail instead of truncating inputs longer than --padding-length
    #[arg(long)]
    no_truncate: bool,

    /// Don't add <|startoftext|> / <|endoftext|>
    #[arg(long)]
    no_boundary: bool,

    /// Omit the attention mask
    #[arg(long)]
    no_mask: bool,

    /// Omit the offset mapping
    #[arg(long)]
    no_offsets: bool,

    /// Output format: text or json
    #[arg(long, default_value = "text", value_parser = validate_output_format)]
    output_format: String,

    /// Suppress all logging
    #[arg(long)]
    log_disable: bool,
}

fn validate_output_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" => Ok(s.to_string()),
        _ => Err(format!("Unknown output format '{}'. Options: text, json", s)),
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    encoding: &'a BatchEncoding,
    batch_size: usize,
    sequence_length: usize,
}

fn main() {
    let args = Args::parse();
    cli::init_logging(args.log_disable);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let inputs = cli::read_inputs(&args.prompt, args.file.as_deref(), args.stdin)?;
    let tokenizer = ClipTokenizer::from_files(&args.vocab, &args.merges, &TokenizerConfig::default())?;

    let options = EncodeOptions {
        include_attention_mask: !args.no_mask,
        include_offsets: !args.no_offsets,
        truncate: !args.no_truncate,
        add_boundary_tokens: !args.no_boundary,
        ..EncodeOptions::default()
    }
    .with_padding_length(args.padding_length);

    let texts: Vec<&str> = inputs.iter().map(String::as_str).collect();
    let encoding = encode_batch(&tokenizer, &texts, &options)?;

    match args.output_format.as_str() {
        "json" => {
            let output = JsonOutput {
                encoding: &encoding,
                batch_size: encoding.batch_size(),
                sequence_length: encoding.sequence_length(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            for (i, text) in texts.iter().enumerate() {
                println!("[{}] {:?}", i, text);
                println!("  input_ids:      {:?}", encoding.input_ids[i]);
                if let Some(mask) = &encoding.attention_mask {
                    println!("  attention_mask: {:?}", mask[i]);
                }
                if let Some(offsets) = &encoding.offset_mapping {
                    println!("  offset_mapping: {:?}", offsets[i]);
                }
            }
        }
    }

    Ok(())
}
