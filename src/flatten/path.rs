//! Field paths and their canonical string form
//!
//! A [`FieldPath`] names one leaf inside a nested record as the sequence of
//! object keys and array indexes leading to it. The canonical string form is
//! the column identity used everywhere downstream: two paths are the same
//! column iff their canonical strings are equal.

use crate::config::FlattenConfig;

/// Column name used for a record whose root is not an object (a bare scalar
/// or a top-level array has no key to name its leaves).
pub const ROOT_VALUE_COLUMN: &str = "value";

/// One step into a nested value: an object member or an array position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// An ordered sequence of path segments identifying one leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn new() -> Self {
        FieldPath { segments: Vec::new() }
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub fn pop(&mut self) {
        self.segments.pop();
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Render the canonical column name for this path.
    ///
    /// Key segments are normalized and joined with the nested-field
    /// delimiter; index segments are joined onto their parent with the
    /// list-index delimiter. An empty path (scalar at the record root) and a
    /// leading index (array at the record root) both fall back to
    /// [`ROOT_VALUE_COLUMN`].
    pub fn canonical(&self, config: &FlattenConfig) -> String {
        if self.segments.is_empty() {
            return ROOT_VALUE_COLUMN.to_string();
        }

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => {
                    if !out.is_empty() {
                        out.push_str(&config.nested_field_delimiter);
                    }
                    push_normalized_key(&mut out, key);
                }
                PathSegment::Index(index) => {
                    if out.is_empty() {
                        out.push_str(ROOT_VALUE_COLUMN);
                    }
                    out.push_str(&config.list_index_delimiter);
                    out.push_str(&index.to_string());
                }
            }
        }
        out
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        FieldPath { segments }
    }
}

/// Normalize a raw object key for use in a column name: lowercase, with
/// spaces and hyphens mapped to underscores. Applied identically in both
/// passes so column identity stays stable.
fn push_normalized_key(out: &mut String, raw: &str) {
    for c in raw.chars().flat_map(char::to_lowercase) {
        out.push(match c {
            ' ' | '-' => '_',
            c => c,
        });
    }
}
