//! Pass-1 schema discovery with a streaming accumulator
//!
//! Instead of building per-record schemas and merging them, statistics are
//! accumulated per canonical path and the schema is built exactly once at
//! stream end. The accumulator retains O(distinct paths), never the records
//! themselves.

use std::collections::HashMap;

use serde_json::Value;
use tracing::trace;

use crate::flatten::FlattenedRecord;
use crate::schema::format::{detect_format, TextFormat};
use crate::schema::types::{ColumnSchema, ColumnType, UnifiedSchema};

/// Format observations for one column's string values.
#[derive(Debug, Default)]
struct StringStats {
    format_counts: HashMap<TextFormat, usize>,
    total_count: usize,
}

impl StringStats {
    fn observe(&mut self, s: &str) {
        self.total_count += 1;
        if let Some(format) = detect_format(s) {
            *self.format_counts.entry(format).or_insert(0) += 1;
        }
    }

    /// The format every observed string agreed on, if any.
    fn agreed_format(&self) -> Option<TextFormat> {
        if self.format_counts.len() != 1 {
            return None;
        }
        let (&format, &count) = self.format_counts.iter().next()?;
        (count == self.total_count).then_some(format)
    }
}

/// Running state for one canonical path.
#[derive(Debug)]
struct ColumnState {
    ty: ColumnType,
    first_seen: u64,
    /// Non-null leaves observed; a format applies only when every one of
    /// them was a string.
    non_null_count: u64,
    strings: StringStats,
}

/// Folds flattened records into a running column table (pass 1).
///
/// Must see the entire stream before [`finish`](Self::finish): any record to
/// come could widen a column's type.
#[derive(Debug, Default)]
pub struct SchemaAccumulator {
    columns: HashMap<String, ColumnState>,
    records_folded: u64,
}

impl SchemaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records folded so far. Zero at stream end means no schema
    /// can be produced.
    pub fn records_folded(&self) -> u64 {
        self.records_folded
    }

    /// Fold one record's leaves into the running table. `ordinal` is the
    /// record's 1-based line number; the first record to introduce a path
    /// fixes that column's position in the final ordering.
    pub fn fold(&mut self, ordinal: u64, record: &FlattenedRecord) {
        self.records_folded += 1;

        for (path, leaf) in record.iter() {
            let ty = ColumnType::of_value(leaf);

            if let Some(state) = self.columns.get_mut(path) {
                let promoted = state.ty.promote(ty);
                if promoted != state.ty {
                    trace!(path = %path, from = state.ty.as_str(), to = promoted.as_str(), "column type widened");
                    state.ty = promoted;
                }
                if ty != ColumnType::Null {
                    state.non_null_count += 1;
                }
                if let Value::String(s) = leaf {
                    state.strings.observe(s);
                }
            } else {
                let mut strings = StringStats::default();
                if let Value::String(s) = leaf {
                    strings.observe(s);
                }
                self.columns.insert(
                    path.clone(),
                    ColumnState {
                        ty,
                        first_seen: ordinal,
                        non_null_count: u64::from(ty != ColumnType::Null),
                        strings,
                    },
                );
            }
        }
    }

    /// Build the unified schema: one entry per distinct path, ordered by
    /// `(first_seen, path)`. Columns only ever observed as null resolve to
    /// text, the safe default.
    pub fn finish(self) -> UnifiedSchema {
        let mut columns: Vec<ColumnSchema> = self
            .columns
            .into_iter()
            .map(|(path, state)| {
                let ty = if state.ty == ColumnType::Null {
                    ColumnType::Text
                } else {
                    state.ty
                };
                // Format is meaningful only for pure string columns (nulls
                // aside); a column promoted from other types gets none.
                let all_strings = state.strings.total_count > 0
                    && state.strings.total_count as u64 == state.non_null_count;
                let format = if ty == ColumnType::Text && all_strings {
                    state.strings.agreed_format()
                } else {
                    None
                };
                ColumnSchema {
                    path,
                    ty,
                    format,
                    first_seen: state.first_seen,
                }
            })
            .collect();

        columns.sort_by(|a, b| {
            a.first_seen
                .cmp(&b.first_seen)
                .then_with(|| a.path.cmp(&b.path))
        });

        UnifiedSchema::new(columns)
    }
}
