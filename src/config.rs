/// Configuration for canonical path construction and flattening limits
///
/// Built once at process start (from CLI flags or a struct literal) and
/// threaded explicitly through the flattener and schema accumulator. Changing
/// a delimiter changes every canonical path produced afterwards, so a config
/// must never be swapped mid-run.
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    /// Delimiter joining nested object keys, e.g. {"user": {"id": 1}} -> "user__id"
    pub nested_field_delimiter: String,

    /// Delimiter joining an array index onto its parent path,
    /// e.g. {"tags": ["a", "b"]} -> "tags_0", "tags_1"
    pub list_index_delimiter: String,

    /// Maximum nesting depth a single record may reach. Records exceeding it
    /// are skipped individually; the run continues.
    pub max_depth: usize,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            nested_field_delimiter: String::from("__"),
            list_index_delimiter: String::from("_"),
            max_depth: 64,
        }
    }
}
