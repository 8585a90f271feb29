//! Column types and the unified schema
//!
//! The type lattice is a total order, `Null < Boolean < Integer < Real <
//! Text`. Two observations of the same column unify to the wider of the two
//! types, so the final type of a column is independent of the order records
//! were visited in.

use serde::Serialize;
use serde_json::Value;

use crate::schema::format::TextFormat;

/// Inferred type of a leaf value. Variant order is the promotion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Null,
    Boolean,
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// Type of a single leaf value.
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Null => ColumnType::Null,
            Value::Bool(_) => ColumnType::Boolean,
            Value::Number(n) => {
                if n.is_f64() {
                    ColumnType::Real
                } else {
                    ColumnType::Integer
                }
            }
            Value::String(_) => ColumnType::Text,
            // Containers never reach leaf position; widest type as a fallback.
            Value::Array(_) | Value::Object(_) => ColumnType::Text,
        }
    }

    /// Widen toward the supremum of the two types. Commutative and
    /// associative, so folding order does not matter.
    pub fn promote(self, other: Self) -> Self {
        self.max(other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Null => "null",
            ColumnType::Boolean => "boolean",
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::Text => "text",
        }
    }
}

/// One discovered column: its canonical path, promoted type, optional text
/// format, and the ordinal of the record that introduced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSchema {
    pub path: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<TextFormat>,
    pub first_seen: u64,
}

/// The ordered union of every column observed across the whole stream.
/// Built once at the end of pass 1, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UnifiedSchema {
    columns: Vec<ColumnSchema>,
}

impl UnifiedSchema {
    /// `columns` must already be ordered by `(first_seen, path)` and hold one
    /// entry per distinct canonical path.
    pub(crate) fn new(columns: Vec<ColumnSchema>) -> Self {
        UnifiedSchema { columns }
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter()
    }

    /// Column paths in schema order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.path.as_str())
    }
}
