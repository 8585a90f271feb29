//! kiln-flatten: Flatten a JSONL stream into a single relational table
//!
//! Usage:
//!   # Read from file, write table to stdout
//!   kiln-flatten events.jsonl
//!
//!   # Read from stdin (buffered: the stream is read twice)
//!   cat events.jsonl | kiln-flatten --table events
//!
//!   # Custom delimiters and output file
//!   kiln-flatten events.jsonl -o flat.jsonl --nested-delimiter "." --max-depth 16

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use kiln::{run, BytesSource, FileSource, FlattenConfig, JsonlSink, JsonlSource, RunReport};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Skipped-record lines printed in the summary before eliding the rest.
const MAX_SKIPS_SHOWN: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "kiln-flatten")]
#[command(about = "Flatten JSONL into a single relational table", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted; stdin is buffered in memory because
    /// the stream is read twice)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Table name (default: the input file stem, or "records" for stdin)
    #[arg(long, short = 't')]
    table: Option<String>,

    /// Output file (stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<String>,

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

    // Build config
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

    let table = match (&args.table, &args.input) {
        (Some(table), _) => table.clone(),
        (None, Some(input)) => Path::new(input)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("records")
            .to_string(),
        (None, None) => String::from("records"),
    };

    // The pipeline reads its source twice, so stdin has to be buffered while
    // a file can be re-opened and streamed.
    let source: Box<dyn JsonlSource> = if let Some(input) = &args.input {
        Box::new(FileSource::new(input))
    } else {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read stdin")?;
        Box::new(BytesSource::new(bytes))
    };

    let writer: Box<dyn Write> = if let Some(output) = &args.output {
        let file = File::create(output)
            .with_context(|| format!("Failed to create output file: {}", output))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(std::io::stdout())
    };

    let mut sink = JsonlSink::new(writer);
    let report = run(source.as_ref(), &mut sink, &table, &config)
        .with_context(|| format!("Failed to convert JSONL into table '{}'", table))?;
    sink.flush()?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    eprintln!(
        "table '{}': {} columns, {} of {} records written",
        report.table, report.column_count, report.rows_written, report.records_seen
    );

    if report.skipped.is_empty() {
        return;
    }

    eprintln!("{} records skipped:", report.skipped.len());
    for skip in report.skipped.iter().take(MAX_SKIPS_SHOWN) {
        eprintln!("  line {}: {}", skip.ordinal, skip.reason);
    }
    if report.skipped.len() > MAX_SKIPS_SHOWN {
        eprintln!("  ... and {} more", report.skipped.len() - MAX_SKIPS_SHOWN);
    }
}
