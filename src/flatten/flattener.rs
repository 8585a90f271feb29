//! Recursive path flattening
//!
//! Walks a parsed record and emits one `(canonical path, leaf value)` pair
//! per scalar or null reached. Containers contribute structure, never
//! values: an empty object or array at any position contributes nothing at
//! all to the flattened record.

use serde_json::Value;

use crate::config::FlattenConfig;
use crate::error::SkipReason;
use crate::flatten::path::{FieldPath, PathSegment};

/// One record's flattened form: canonical path to leaf scalar, in flatten
/// order. Recomputed on every pass, never cached between passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedRecord {
    pub leaves: Vec<(String, Value)>,
}

impl FlattenedRecord {
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.leaves.iter()
    }
}

/// The core path flattener
pub struct Flattener<'a> {
    config: &'a FlattenConfig,
}

impl<'a> Flattener<'a> {
    pub fn new(config: &'a FlattenConfig) -> Self {
        Flattener { config }
    }

    /// Flatten a parsed record into its leaf columns.
    ///
    /// Fails only when the record nests deeper than the configured maximum;
    /// the failure is local to this record.
    pub fn flatten(&self, value: &Value) -> Result<FlattenedRecord, SkipReason> {
        let mut leaves = Vec::new();
        let mut path = FieldPath::new();
        self.walk(value, &mut path, 0, &mut leaves)?;
        Ok(FlattenedRecord { leaves })
    }

    fn walk(
        &self,
        value: &Value,
        path: &mut FieldPath,
        depth: usize,
        leaves: &mut Vec<(String, Value)>,
    ) -> Result<(), SkipReason> {
        if depth > self.config.max_depth {
            return Err(SkipReason::DepthExceeded {
                max_depth: self.config.max_depth,
            });
        }

        match value {
            Value::Object(obj) => {
                for (key, child) in obj.iter() {
                    path.push(PathSegment::Key(key.clone()));
                    let result = self.walk(child, path, depth + 1, leaves);
                    path.pop();
                    result?;
                }
            }
            Value::Array(arr) => {
                for (index, child) in arr.iter().enumerate() {
                    path.push(PathSegment::Index(index));
                    let result = self.walk(child, path, depth + 1, leaves);
                    path.pop();
                    result?;
                }
            }
            leaf => {
                leaves.push((path.canonical(self.config), leaf.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flatten(value: Value) -> Vec<(String, Value)> {
        let config = FlattenConfig::default();
        Flattener::new(&config).flatten(&value).unwrap().leaves
    }

    #[test]
    fn test_simple_nested_object() {
        let leaves = flatten(json!({"user": {"name": "John"}}));
        assert_eq!(leaves, vec![("user__name".to_string(), json!("John"))]);
    }

    #[test]
    fn test_array_of_scalars() {
        let leaves = flatten(json!({"tags": ["a", "b", "c"]}));
        assert_eq!(
            leaves,
            vec![
                ("tags_0".to_string(), json!("a")),
                ("tags_1".to_string(), json!("b")),
                ("tags_2".to_string(), json!("c")),
            ]
        );
    }

    #[test]
    fn test_objects_inside_arrays() {
        let leaves = flatten(json!({"items": [{"sku": "X"}]}));
        assert_eq!(leaves, vec![("items_0__sku".to_string(), json!("X"))]);
    }

    #[test]
    fn test_empty_containers_contribute_no_leaves() {
        assert!(flatten(json!({"meta": {}})).is_empty());
        assert!(flatten(json!({"tags": []})).is_empty());
    }

    #[test]
    fn test_null_is_a_leaf() {
        let leaves = flatten(json!({"name": "John", "age": null}));
        assert_eq!(
            leaves,
            vec![
                ("age".to_string(), Value::Null),
                ("name".to_string(), json!("John")),
            ]
        );
    }

    #[test]
    fn test_scalars_keep_native_types() {
        let leaves = flatten(json!({"n": 42, "f": 3.5, "b": true}));
        assert!(leaves.contains(&("n".to_string(), json!(42))));
        assert!(leaves.contains(&("f".to_string(), json!(3.5))));
        assert!(leaves.contains(&("b".to_string(), json!(true))));
    }

    #[test]
    fn test_deeply_nested_object() {
        let leaves = flatten(json!({"l1": {"l2": {"l3": {"value": "deep"}}}}));
        assert_eq!(
            leaves,
            vec![("l1__l2__l3__value".to_string(), json!("deep"))]
        );
    }

    #[test]
    fn test_depth_limit_fails_the_record_only() {
        let config = FlattenConfig {
            max_depth: 2,
            ..FlattenConfig::default()
        };
        let flattener = Flattener::new(&config);

        let shallow = json!({"a": {"b": 1}});
        assert!(flattener.flatten(&shallow).is_ok());

        let deep = json!({"a": {"b": {"c": 1}}});
        assert_eq!(
            flattener.flatten(&deep).unwrap_err(),
            SkipReason::DepthExceeded { max_depth: 2 }
        );
    }

    #[test]
    fn test_root_scalar() {
        let leaves = flatten(json!("lone"));
        assert_eq!(leaves, vec![("value".to_string(), json!("lone"))]);
    }

    #[test]
    fn test_root_array() {
        let leaves = flatten(json!([1, 2]));
        assert_eq!(
            leaves,
            vec![
                ("value_0".to_string(), json!(1)),
                ("value_1".to_string(), json!(2)),
            ]
        );
    }
}
