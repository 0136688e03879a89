//! Shared plumbing for the command-line drivers.

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// Installs a stderr logger that respects `RUST_LOG`.
///
/// If the environment variable is not set, only warnings and errors are shown
/// so that stdout carries just the report.
pub fn init_subscriber() {
    let fmt_layer = fmt::layer().with_target(true).with_writer(io::stderr);

    let filter_layer = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

/// Prompts for the matrix size on stdout and reads it from `input`.
pub fn prompt_dim<R: BufRead>(input: &mut R) -> Result<usize> {
    print!("Enter the matrix size N (for NxN): ");
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("no matrix size given on standard input");
    }
    parse_dim(&line)
}

pub fn parse_dim(text: &str) -> Result<usize> {
    let text = text.trim();
    let dim: usize = text
        .parse()
        .with_context(|| format!("invalid matrix size {text:?}"))?;
    if dim == 0 {
        bail!("matrix size must be positive");
    }
    Ok(dim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dim() {
        assert_eq!(parse_dim("12\n").unwrap(), 12);
        assert_eq!(parse_dim("  4 ").unwrap(), 4);
        assert!(parse_dim("0").is_err());
        assert!(parse_dim("-3").is_err());
        assert!(parse_dim("abc").is_err());
    }

    #[test]
    fn test_prompt_dim_reads_first_line() {
        let mut input = io::Cursor::new("8\n16\n");
        assert_eq!(prompt_dim(&mut input).unwrap(), 8);
    }

    #[test]
    fn test_prompt_dim_empty_input() {
        let mut input = io::Cursor::new("");
        assert!(prompt_dim(&mut input).is_err());
    }
}
