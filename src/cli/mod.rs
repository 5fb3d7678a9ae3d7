//! Shared utilities for the `cliptok` binary.

use std::io::Read;
use std::path::Path;

/// Install the `cliptok` stderr subscriber.
///
/// `--log-disable` skips it entirely. Otherwise `RUST_LOG` selects the
/// filter, falling back to `warn` so tokenizer load messages stay quiet
/// unless asked for. A second call leaves the first subscriber in place.
pub fn init_logging(disable: bool) {
    use tracing_subscriber::EnvFilter;

    if disable {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Read the batch of input strings from one of: prompt strings, a file, or
/// stdin. File and stdin input contribute one string per line.
///
/// Returns an error message string if no input source is provided.
pub fn read_inputs(
    prompts: &[String],
    file: Option<&Path>,
    use_stdin: bool,
) -> Result<Vec<String>, String> {
    if !prompts.is_empty() {
        return Ok(prompts.to_vec());
    }

    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .map(|text| split_lines(&text))
            .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e));
    }

    if use_stdin {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
        return Ok(split_lines(&buf));
    }

    Err("No input provided. Use --prompt, --file, or --stdin".to_string())
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}
