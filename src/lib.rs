//! # Kiln - JSONL to Relational Table Conversion
//!
//! A library for flattening newline-delimited JSON streams of heterogeneous,
//! arbitrarily-nested records into a single flat table schema plus
//! schema-aligned rows, ready for a relational sink.
//!
//! ## Modules
//!
//! - **flatten**: canonical path flattening of nested objects and arrays
//! - **schema**: two-pass schema discovery with type promotion and format detection
//! - **materialize**: schema-aligned row production with null filling
//! - **pipeline**: the two-pass driver and its run report
//! - **sink**: the table-sink contract plus JSONL and in-memory sinks
//!
//! ## Quick Start
//!
//! ```rust
//! use kiln::{run, BytesSource, FlattenConfig, MemorySink};
//!
//! # fn main() -> Result<(), kiln::PipelineError> {
//! let source = BytesSource::new(
//!     "{\"user\": {\"id\": 1}}\n{\"user\": {\"id\": 2}, \"tags\": [\"a\"]}\n",
//! );
//! let mut sink = MemorySink::new();
//! let report = run(&source, &mut sink, "events", &FlattenConfig::default())?;
//!
//! assert_eq!(report.rows_written, 2);
//! assert_eq!(report.column_count, 2);
//!
//! let schema = sink.schema("events").unwrap();
//! assert_eq!(schema.paths().collect::<Vec<_>>(), vec!["user__id", "tags_0"]);
//! # Ok(())
//! # }
//! ```
//!
//! ### Schema discovery only
//!
//! ```rust
//! use kiln::{discover_schema, BytesSource, ColumnType, FlattenConfig};
//!
//! let source = BytesSource::new("{\"x\": 1}\n{\"x\": 2.5}\n");
//! let discovery = discover_schema(&source, &FlattenConfig::default()).unwrap();
//!
//! // Integer then Real promotes to Real.
//! assert_eq!(discovery.schema.columns()[0].ty, ColumnType::Real);
//! ```

use std::io::Write;

pub mod config;
pub mod error;
pub mod flatten;
pub mod materialize;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod source;

// Re-export commonly used types for convenience
pub use config::FlattenConfig;
pub use error::{PipelineError, RecordSkip, SkipReason};
pub use flatten::{FieldPath, FlattenedRecord, Flattener, PathSegment};
pub use materialize::{Row, RowMaterializer};
pub use pipeline::{discover_schema, run, RunReport, SchemaDiscovery};
pub use schema::{ColumnSchema, ColumnType, SchemaAccumulator, TextFormat, UnifiedSchema};
pub use sink::{JsonlSink, MemorySink, SinkError, TableHandle, TableSink};
pub use source::{BytesSource, FileSource, JsonlSource, Record, RecordIter};

/// Convenience entry point: convert an in-memory JSONL buffer into a table
/// written to `writer` as JSON Lines (schema header, then one object per
/// row).
pub fn convert_jsonl<W: Write>(
    bytes: impl Into<Vec<u8>>,
    table: &str,
    writer: W,
    config: &FlattenConfig,
) -> Result<RunReport, PipelineError> {
    let source = BytesSource::new(bytes);
    let mut sink = JsonlSink::new(writer);
    let report = pipeline::run(&source, &mut sink, table, config)?;
    sink.flush()?;
    Ok(report)
}
