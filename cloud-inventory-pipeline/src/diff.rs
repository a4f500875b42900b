//! Structural diff between two entity snapshots.
//!
//! The patch format follows JSON Patch (add / remove / replace with JSON Pointer
//! paths). Object keys are walked in sorted order, so the same inputs always give
//! the same patch.

use std::collections::BTreeSet;

use cloud_inventory_shared::PatchOperation;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("Invalid pointer: {0}")]
    InvalidPointer(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Invalid array index in {0}")]
    InvalidIndex(String),
}

/// Computes the operations turning `old` into `new`. Empty means no change.
pub fn compute_patch(old: &Value, new: &Value) -> Vec<PatchOperation> {
    let mut operations = Vec::new();
    diff_into("", old, new, &mut operations);
    operations
}

fn diff_into(path: &str, old: &Value, new: &Value, operations: &mut Vec<PatchOperation>) {
    if old == new {
        return;
    }

    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let keys: BTreeSet<&String> = old_map.keys().chain(new_map.keys()).collect();
            for key in keys {
                let child = format!("{}/{}", path, escape_token(key));
                match (old_map.get(key), new_map.get(key)) {
                    (Some(old_value), Some(new_value)) => {
                        diff_into(&child, old_value, new_value, operations)
                    }
                    (Some(_), None) => operations.push(PatchOperation::Remove { path: child }),
                    (None, Some(new_value)) => operations.push(PatchOperation::Add {
                        path: child,
                        value: new_value.clone(),
                    }),
                    (None, None) => {}
                }
            }
        }
        (Value::Array(old_items), Value::Array(new_items)) => {
            let common = old_items.len().min(new_items.len());
            for index in 0..common {
                let child = format!("{}/{}", path, index);
                diff_into(&child, &old_items[index], &new_items[index], operations);
            }
            // trailing removals go from the highest index down so each path stays valid
            for index in (common..old_items.len()).rev() {
                operations.push(PatchOperation::Remove {
                    path: format!("{}/{}", path, index),
                });
            }
            for (index, value) in new_items.iter().enumerate().skip(common) {
                operations.push(PatchOperation::Add {
                    path: format!("{}/{}", path, index),
                    value: value.clone(),
                });
            }
        }
        _ => operations.push(PatchOperation::Replace {
            path: path.to_string(),
            value: new.clone(),
        }),
    }
}

fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Splits a pointer into its parent pointer and unescaped last token.
fn split_pointer(path: &str) -> Result<(&str, String), PatchError> {
    if !path.starts_with('/') {
        return Err(PatchError::InvalidPointer(path.to_string()));
    }
    match path.rfind('/') {
        Some(position) => Ok((&path[..position], unescape_token(&path[position + 1..]))),
        None => Err(PatchError::InvalidPointer(path.to_string())),
    }
}

fn parse_index(token: &str, path: &str) -> Result<usize, PatchError> {
    token
        .parse::<usize>()
        .map_err(|_| PatchError::InvalidIndex(path.to_string()))
}

/// Applies `operations` to a copy of `document`.
pub fn apply_patch(document: &Value, operations: &[PatchOperation]) -> Result<Value, PatchError> {
    let mut document = document.clone();
    for operation in operations {
        apply_operation(&mut document, operation)?;
    }
    Ok(document)
}

fn apply_operation(document: &mut Value, operation: &PatchOperation) -> Result<(), PatchError> {
    let path = operation.path();
    if path.is_empty() {
        return match operation {
            PatchOperation::Add { value, .. } | PatchOperation::Replace { value, .. } => {
                *document = value.clone();
                Ok(())
            }
            PatchOperation::Remove { .. } => Err(PatchError::InvalidPointer(path.to_string())),
        };
    }

    let (parent_path, token) = split_pointer(path)?;
    let parent = document
        .pointer_mut(parent_path)
        .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;

    match (parent, operation) {
        (Value::Object(map), PatchOperation::Add { value, .. }) => {
            map.insert(token, value.clone());
        }
        (Value::Object(map), PatchOperation::Replace { value, .. }) => {
            let slot = map
                .get_mut(&token)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
            *slot = value.clone();
        }
        (Value::Object(map), PatchOperation::Remove { .. }) => {
            map.remove(&token)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
        }
        (Value::Array(items), PatchOperation::Add { value, .. }) => {
            if token == "-" {
                items.push(value.clone());
            } else {
                let index = parse_index(&token, path)?;
                if index > items.len() {
                    return Err(PatchError::InvalidIndex(path.to_string()));
                }
                items.insert(index, value.clone());
            }
        }
        (Value::Array(items), PatchOperation::Replace { value, .. }) => {
            let index = parse_index(&token, path)?;
            let slot = items
                .get_mut(index)
                .ok_or_else(|| PatchError::InvalidIndex(path.to_string()))?;
            *slot = value.clone();
        }
        (Value::Array(items), PatchOperation::Remove { .. }) => {
            let index = parse_index(&token, path)?;
            if index >= items.len() {
                return Err(PatchError::InvalidIndex(path.to_string()));
            }
            items.remove(index);
        }
        _ => return Err(PatchError::PathNotFound(path.to_string())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group_snapshot() -> Value {
        json!({
            "resource_id": "/subscriptions/s/resourcegroups/rg",
            "name": "rg",
            "location": "westeurope",
            "metas": {"provisioningState": "Succeeded"},
            "tags": {"env": "prod"},
            "deleted": false
        })
    }

    #[test]
    fn test_identical_snapshots_give_empty_patch() {
        assert!(compute_patch(&group_snapshot(), &group_snapshot()).is_empty());
    }

    #[test]
    fn test_new_tag_is_an_add() {
        let old = group_snapshot();
        let mut new = group_snapshot();
        new["tags"]["team"] = json!("core");

        assert_eq!(
            compute_patch(&old, &new),
            vec![PatchOperation::Add {
                path: "/tags/team".to_string(),
                value: json!("core"),
            }]
        );
    }

    #[test]
    fn test_changed_and_removed_fields() {
        let old = group_snapshot();
        let mut new = group_snapshot();
        new["location"] = json!("northeurope");
        new["metas"].as_object_mut().unwrap().remove("provisioningState");

        assert_eq!(
            compute_patch(&old, &new),
            vec![
                PatchOperation::Replace {
                    path: "/location".to_string(),
                    value: json!("northeurope"),
                },
                PatchOperation::Remove {
                    path: "/metas/provisioningState".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_type_change_replaces_whole_value() {
        let old = json!({"sku": null});
        let new = json!({"sku": {"name": "F1"}});
        assert_eq!(
            compute_patch(&old, &new),
            vec![PatchOperation::Replace {
                path: "/sku".to_string(),
                value: json!({"name": "F1"}),
            }]
        );
    }

    #[test]
    fn test_keys_are_escaped() {
        let old = json!({"tags": {}});
        let new = json!({"tags": {"a/b~c": "x"}});
        assert_eq!(compute_patch(&old, &new)[0].path(), "/tags/a~1b~0c");
    }

    #[test]
    fn test_patch_is_deterministic() {
        let old = json!({"z": 1, "a": [1, 2, 3], "m": {"y": 1, "b": 2}});
        let new = json!({"a": [1], "m": {"b": 3, "c": 4}, "n": true});
        let first = serde_json::to_string(&compute_patch(&old, &new)).unwrap();
        let second = serde_json::to_string(&compute_patch(&old, &new)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_array_shrink_removes_from_the_end() {
        let old = json!({"a": [1, 2, 3]});
        let new = json!({"a": [1]});
        assert_eq!(
            compute_patch(&old, &new),
            vec![
                PatchOperation::Remove { path: "/a/2".to_string() },
                PatchOperation::Remove { path: "/a/1".to_string() },
            ]
        );
    }

    #[test]
    fn test_apply_patch_reproduces_new_snapshot() {
        let cases = [
            (group_snapshot(), json!({"name": "rg", "tags": {"a/b": "1"}, "list": [1, 2]})),
            (json!({"a": [1, 2, 3], "b": {"c": 1}}), json!({"a": [4], "b": {"d": [true]}})),
            (json!({"a": []}), json!({"a": [1, {"x": 2}]})),
            (json!({"a": 1}), json!([1, 2])),
        ];
        for (old, new) in cases {
            let patch = compute_patch(&old, &new);
            assert_eq!(apply_patch(&old, &patch).unwrap(), new);
        }
    }

    #[test]
    fn test_apply_patch_rejects_missing_path() {
        let result = apply_patch(
            &json!({"a": 1}),
            &[PatchOperation::Remove { path: "/b".to_string() }],
        );
        assert_eq!(result, Err(PatchError::PathNotFound("/b".to_string())));

        let result = apply_patch(
            &json!({"a": [1]}),
            &[PatchOperation::Replace { path: "/a/5".to_string(), value: json!(2) }],
        );
        assert_eq!(result, Err(PatchError::InvalidIndex("/a/5".to_string())));
    }
}
