//! Pass-2 row materialization
//!
//! Re-flattens each record and aligns it to the unified schema built in pass
//! 1. Every row has exactly one value per schema column; paths the record
//! does not carry are filled with null. The "plan" is fixed up front, so
//! per-record work is a flatten plus index lookups.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::FlattenConfig;
use crate::error::SkipReason;
use crate::flatten::Flattener;
use crate::schema::UnifiedSchema;

/// One materialized record: values positionally aligned to the unified
/// schema, `Value::Null` where the record had no leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// The row as a path-keyed object, zipped against its schema.
    pub fn to_map(&self, schema: &UnifiedSchema) -> Map<String, Value> {
        schema
            .paths()
            .zip(self.values.iter())
            .map(|(path, value)| (path.to_string(), value.clone()))
            .collect()
    }
}

/// Materializes records against a fixed unified schema.
pub struct RowMaterializer<'a> {
    schema: &'a UnifiedSchema,
    flattener: Flattener<'a>,
    // Canonical path -> column position, built once.
    index: HashMap<&'a str, usize>,
}

impl<'a> RowMaterializer<'a> {
    pub fn new(schema: &'a UnifiedSchema, config: &'a FlattenConfig) -> Self {
        let index = schema
            .paths()
            .enumerate()
            .map(|(position, path)| (path, position))
            .collect();

        RowMaterializer {
            schema,
            flattener: Flattener::new(config),
            index,
        }
    }

    /// Flatten one record and align it to the schema. Fails only for this
    /// record (depth limit); the value's native scalar types are carried
    /// through unchanged.
    pub fn materialize(&self, value: &Value) -> Result<Row, SkipReason> {
        let flat = self.flattener.flatten(value)?;
        let mut values = vec![Value::Null; self.schema.len()];

        for (path, leaf) in flat.leaves {
            match self.index.get(path.as_str()) {
                Some(&position) => values[position] = leaf,
                // Source changed between passes; the column does not exist.
                None => debug!(path = %path, "leaf outside the unified schema, dropped"),
            }
        }

        Ok(Row { values })
    }
}
