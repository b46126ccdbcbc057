//! `coerce` CLI: coerce JSON documents to a schema type from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # One document from stdin
//! echo '"2023/01/15"' | coerce --type date
//!
//! # One document per line, failures written as null
//! coerce --type integer --lines --null-on-failure -i values.jsonl
//!
//! # Narrow a legacy union before coercing
//! echo '42' | coerce --type 'legacy_union<integer,string>' --legacy-unions
//!
//! # Show why values were rejected
//! coerce --type timestamp_tz --lines --log-level trace -i events.jsonl
//! ```
//!
//! Each coerced document is written as compact JSON on its own line. Without
//! `--null-on-failure`, documents that cannot be coerced are reported on stderr
//! and the process exits with status 1 once every document has been processed.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use coerce_core::{coerce, json, SchemaType};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "coerce",
    version,
    about = "Coerce JSON documents to a schema type"
)]
struct Cli {
    /// Target type, e.g. integer, timestamp_tz, array<date>, legacy_union<integer,string>
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    target: SchemaType,

    /// Input file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,

    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,

    /// Narrow legacy unions to a single member type before coercing
    #[arg(long)]
    legacy_unions: bool,

    /// Treat each non-blank input line as a separate JSON document
    #[arg(long)]
    lines: bool,

    /// Write null for documents that cannot be coerced instead of failing
    #[arg(long)]
    null_on_failure: bool,

    /// Log filter (overrides RUST_LOG), e.g. "debug" or "coerce_core=trace"
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    let input = read_input(cli.input.as_deref())?;
    let documents = split_documents(&input, cli.lines);
    tracing::debug!(documents = documents.len(), target_type = %cli.target, "coercing input");

    let mut lines = Vec::with_capacity(documents.len());
    let mut failures = 0usize;
    for (number, document) in documents {
        let value = json::parse_str(document)
            .with_context(|| format!("Failed to parse JSON document {number}"))?;
        let coerced = coerce(&value, &cli.target, cli.legacy_unions)
            .with_context(|| format!("Failed to coerce document {number}"))?;
        match coerced {
            Some(coerced) => lines.push(
                json::serialize_to_string(&coerced)
                    .with_context(|| format!("Failed to serialize document {number}"))?,
            ),
            None if cli.null_on_failure => lines.push("null".to_string()),
            None => {
                failures += 1;
                eprintln!(
                    "document {number}: {} value is not coercible to {}",
                    value.kind(),
                    cli.target
                );
            }
        }
    }

    write_documents(cli.output.as_deref(), &lines)?;

    if failures > 0 {
        eprintln!("{failures} document(s) could not be coerced to {}", cli.target);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Log to stderr. `--log-level` wins over `RUST_LOG`; the default is `warn`.
fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("Invalid log level: {level}"))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

/// Number the documents in `input` from 1.
///
/// In line mode blank lines are skipped but still counted, so numbers match
/// line numbers.
fn split_documents(input: &str, lines: bool) -> Vec<(usize, &str)> {
    if lines {
        input
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect()
    } else {
        vec![(1, input.trim())]
    }
}

/// The whole input, from `path` or stdin.
fn read_input(path: Option<&str>) -> Result<String> {
    let Some(path) = path else {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        return Ok(buf);
    };
    std::fs::read_to_string(path).with_context(|| format!("Failed to read input file: {path}"))
}

/// Write one serialized document per line, to `path` or stdout.
fn write_documents(path: Option<&str>, documents: &[String]) -> Result<()> {
    let mut content = String::with_capacity(documents.iter().map(|d| d.len() + 1).sum());
    for document in documents {
        content.push_str(document);
        content.push('\n');
    }
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write output file: {path}")),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .and_then(|()| stdout.flush())
                .context("Failed to write to stdout")
        }
    }
}
