use serde_json::{Map, Value};

use super::{EACH, NONE};
use crate::domain::error::{ExpandError, ExpandResult};
use crate::domain::path::kind_name;
use crate::domain::versions::Versions;
use crate::domain::visitor::Resolved;

/// Turn a node holding `$each` into one version per listed item.
///
/// - `"$None"` yields the node without `$each`
/// - a mapping item yields the item merged with the node's other keys; the
///   node's keys win on conflict
/// - any other item replaces the node, which is only allowed when `$each` is
///   the node's sole key
pub fn apply_each(mut node: Map<String, Value>) -> ExpandResult<Resolved> {
    let Some(each) = node.shift_remove(EACH) else {
        return Ok(Resolved::Single(Value::Object(node)));
    };
    let items = match each {
        Value::Array(items) => items,
        other => {
            return Err(ExpandError::structure(
                EACH,
                format!("requires a list, not a {}", kind_name(&other)),
                other,
            ))
        }
    };

    let mergeable = |item: &Value| item.is_object() || item.as_str() == Some(NONE);
    if !node.is_empty() && !items.iter().all(mergeable) {
        node.insert(EACH.to_string(), Value::Array(items));
        return Err(ExpandError::structure(
            EACH,
            "in a non-empty node only mappings or $None can be listed",
            Value::Object(node),
        ));
    }

    let mut versions = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) if s == NONE => versions.push(Value::Object(node.clone())),
            Value::Object(mut merged) => {
                for (key, value) in &node {
                    merged.insert(key.clone(), value.clone());
                }
                versions.push(Value::Object(merged));
            }
            other => versions.push(other),
        }
    }

    Versions::new(versions)
        .map(Resolved::Many)
        .ok_or_else(|| ExpandError::structure(EACH, "requires at least one item", "[]"))
}
