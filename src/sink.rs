//! The sink boundary
//!
//! The core hands the sink an ordered schema exactly once, then a stream of
//! schema-aligned rows. Identifier legality rules belong to the sink; the
//! core only guarantees the delimiter characters it inserts are lowercase
//! identifier-safe.

use std::collections::HashMap;
use std::io::Write;

use serde_json::{json, Value};
use thiserror::Error;

use crate::materialize::Row;
use crate::schema::UnifiedSchema;

/// Opaque failure from a sink collaborator. Terminal for the run.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl SinkError {
    pub fn other(message: impl Into<String>) -> Self {
        SinkError::Other(message.into())
    }
}

/// Handle to a created table, passed back on every append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    pub name: String,
}

/// Contract the core requires from the relational collaborator.
///
/// `create_table` is called exactly once per run, before any row is
/// materialized; `append_rows` is called repeatedly with bounded batches in
/// stream order and returns the number of rows appended.
pub trait TableSink {
    fn create_table(
        &mut self,
        name: &str,
        schema: &UnifiedSchema,
    ) -> Result<TableHandle, SinkError>;

    fn append_rows(&mut self, handle: &TableHandle, rows: &[Row]) -> Result<u64, SinkError>;
}

/// Writes a table as JSON Lines to any `Write`: one schema header line, then
/// one object per row keyed by column path.
pub struct JsonlSink<W: Write> {
    writer: W,
    columns: Vec<String>,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        JsonlSink {
            writer,
            columns: Vec::new(),
        }
    }

    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TableSink for JsonlSink<W> {
    fn create_table(
        &mut self,
        name: &str,
        schema: &UnifiedSchema,
    ) -> Result<TableHandle, SinkError> {
        self.columns = schema.paths().map(str::to_string).collect();

        let header = json!({
            "_table": name,
            "_columns": schema,
        });
        let line = serde_json::to_string(&header)
            .map_err(|e| SinkError::other(format!("failed to serialize schema: {e}")))?;
        writeln!(self.writer, "{}", line)?;

        Ok(TableHandle {
            name: name.to_string(),
        })
    }

    fn append_rows(&mut self, _handle: &TableHandle, rows: &[Row]) -> Result<u64, SinkError> {
        for row in rows {
            let object: serde_json::Map<String, Value> = self
                .columns
                .iter()
                .cloned()
                .zip(row.values().iter().cloned())
                .collect();
            let line = serde_json::to_string(&object)
                .map_err(|e| SinkError::other(format!("failed to serialize row: {e}")))?;
            writeln!(self.writer, "{}", line)?;
        }
        Ok(rows.len() as u64)
    }
}

/// Retains everything in memory. Used by tests and by callers that want the
/// materialized table back as data.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: HashMap<String, (UnifiedSchema, Vec<Row>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(&self, table: &str) -> Option<&UnifiedSchema> {
        self.tables.get(table).map(|(schema, _)| schema)
    }

    pub fn rows(&self, table: &str) -> Option<&[Row]> {
        self.tables.get(table).map(|(_, rows)| rows.as_slice())
    }
}

impl TableSink for MemorySink {
    fn create_table(
        &mut self,
        name: &str,
        schema: &UnifiedSchema,
    ) -> Result<TableHandle, SinkError> {
        // Re-creating replaces the table, matching replace-existing semantics.
        self.tables
            .insert(name.to_string(), (schema.clone(), Vec::new()));
        Ok(TableHandle {
            name: name.to_string(),
        })
    }

    fn append_rows(&mut self, handle: &TableHandle, rows: &[Row]) -> Result<u64, SinkError> {
        let (_, stored) = self
            .tables
            .get_mut(&handle.name)
            .ok_or_else(|| SinkError::other(format!("unknown table: {}", handle.name)))?;
        stored.extend_from_slice(rows);
        Ok(rows.len() as u64)
    }
}
