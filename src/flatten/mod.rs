//! Canonical path flattening
//!
//! Converts nested records into scalar leaves named by delimiter-joined
//! path segments. Flattening is deterministic and configuration-driven; it
//! is run once per record per pass, so both passes see identical leaves for
//! identical input.

pub mod flattener;
pub mod path;

pub use flattener::{FlattenedRecord, Flattener};
pub use path::{FieldPath, PathSegment, ROOT_VALUE_COLUMN};
