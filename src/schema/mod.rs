//! Schema discovery
//!
//! Pass 1 of the pipeline: the union of every canonical path observed across
//! the stream, each with a type promoted over all of its observations and an
//! optional detected text format.

pub mod accumulator;
pub mod format;
pub mod types;

pub use accumulator::SchemaAccumulator;
pub use format::{detect_format, TextFormat};
pub use types::{ColumnSchema, ColumnType, UnifiedSchema};
