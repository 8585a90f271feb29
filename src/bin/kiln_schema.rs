//! kiln-schema: Discover the unified schema of a JSONL stream
//!
//! Runs schema discovery only (pass 1) and prints the ordered column list
//! with promoted types and detected text formats.
//!
//! Usage:
//!   # Read from file, output to stdout
//!   kiln-schema events.jsonl
//!
//!   # Read from stdin, compact output
//!   cat events.jsonl | kiln-schema --compact

use anyhow::{Context, Result};
use clap::Parser;
use kiln::{discover_schema, BytesSource, FileSource, FlattenConfig, JsonlSource};
use std::io::Read;

#[derive(Parser, Debug)]
#[command(name = "kiln-schema")]
#[command(about = "Discover the unified schema of a JSONL stream", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,

    /// Delimiter joining nested object keys (default: "__")
    #[arg(long)]
    nested_delimiter: Option<String>,

    /// Delimiter joining an array index onto its parent path (default: "_")
    #[arg(long)]
    index_delimiter: Option<String>,

    /// Maximum record nesting depth; deeper records are skipped individually
    #[arg(long)]
    max_depth: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = FlattenConfig::default();
    if let Some(delim) = args.nested_delimiter {
        config.nested_field_delimiter = delim;
    }
    if let Some(delim) = args.index_delimiter {
        config.list_index_delimiter = delim;
    }
    if let Some(depth) = args.max_depth {
        config.max_depth = depth;
    }

    let source: Box<dyn JsonlSource> = if let Some(input) = &args.input {
        Box::new(FileSource::new(input))
    } else {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read stdin")?;
        Box::new(BytesSource::new(bytes))
    };

    let discovery =
        discover_schema(source.as_ref(), &config).context("Failed to discover schema")?;

    let output = if args.compact {
        serde_json::to_string(&discovery.schema)?
    } else {
        serde_json::to_string_pretty(&discovery.schema)?
    };
    println!("{}", output);

    eprintln!(
        "{} columns from {} records ({} skipped)",
        discovery.schema.len(),
        discovery.records_folded,
        discovery.skipped.len()
    );
    Ok(())
}
