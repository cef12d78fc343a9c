//! Generic recursion over configuration trees
//!
//! [`recursive_apply`] visits a tree bottom-up and hands every mapping to a
//! transformation. Multi-valued children are lifted into the parent: a mapping or
//! sequence with any [`Versions`] child becomes a [`Versions`] of concrete nodes,
//! one per combination. The transformation is applied to mappings only; sequences
//! are rebuilt positionally.

use serde_json::{Map, Value};

use crate::domain::error::ExpandResult;
use crate::domain::versions::Versions;

/// Outcome of visiting a node: one concrete value, or several alternatives.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Single(Value),
    Many(Versions<Value>),
}

impl Resolved {
    /// Every concrete alternative, in order.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Resolved::Single(value) => vec![value],
            Resolved::Many(versions) => versions.into_vec(),
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, Resolved::Many(_))
    }
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        Resolved::Single(value)
    }
}

/// Transformation applied to every mapping node.
pub type NodeFn<'f> = dyn FnMut(Map<String, Value>) -> ExpandResult<Resolved> + 'f;

/// Apply `f` to every mapping in `node`, lifting multi-valued children.
///
/// Scalars are returned unchanged. A mapping whose children are all single-valued
/// is passed to `f` directly. Otherwise one concrete mapping is built per
/// combination of its multi-valued children (first multi-valued key outermost),
/// `f` is applied to each, and the results are collected into a `Versions`,
/// flattening results that are themselves multi-valued.
pub fn recursive_apply(node: Value, f: &mut NodeFn<'_>) -> ExpandResult<Resolved> {
    match node {
        Value::Object(map) => apply_mapping(map, f),
        Value::Array(items) => apply_sequence(items, f),
        scalar => Ok(Resolved::Single(scalar)),
    }
}

enum Slot {
    Fixed(Value),
    Multi,
}

fn apply_mapping(map: Map<String, Value>, f: &mut NodeFn<'_>) -> ExpandResult<Resolved> {
    let mut slots: Vec<(String, Slot)> = Vec::with_capacity(map.len());
    let mut multi: Vec<Versions<Value>> = Vec::new();

    for (key, value) in map {
        match recursive_apply(value, f)? {
            Resolved::Single(value) => slots.push((key, Slot::Fixed(value))),
            Resolved::Many(versions) => {
                multi.push(versions);
                slots.push((key, Slot::Multi));
            }
        }
    }

    let Some(combinations) = Versions::cartesian(multi) else {
        let concrete = slots
            .into_iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Fixed(value) => Some((key, value)),
                Slot::Multi => None,
            })
            .collect();
        return f(concrete);
    };

    let mut results: Vec<Versions<Value>> = Vec::with_capacity(combinations.len());
    for combination in combinations {
        let mut chosen = combination.into_iter();
        let mut concrete = Map::with_capacity(slots.len());
        for (key, slot) in &slots {
            let value = match slot {
                Slot::Fixed(value) => value.clone(),
                Slot::Multi => chosen.next().unwrap_or(Value::Null),
            };
            concrete.insert(key.clone(), value);
        }
        results.push(match f(concrete)? {
            Resolved::Single(value) => Versions::single(value),
            Resolved::Many(versions) => versions,
        });
    }
    Ok(match Versions::new(results) {
        Some(nested) => Resolved::Many(Versions::flatten(nested)),
        None => Resolved::Single(Value::Null),
    })
}

fn apply_sequence(items: Vec<Value>, f: &mut NodeFn<'_>) -> ExpandResult<Resolved> {
    let mut fixed: Vec<Option<Value>> = Vec::with_capacity(items.len());
    let mut multi: Vec<Versions<Value>> = Vec::new();

    for item in items {
        match recursive_apply(item, f)? {
            Resolved::Single(value) => fixed.push(Some(value)),
            Resolved::Many(versions) => {
                multi.push(versions);
                fixed.push(None);
            }
        }
    }

    let Some(combinations) = Versions::cartesian(multi) else {
        return Ok(Resolved::Single(Value::Array(
            fixed.into_iter().flatten().collect(),
        )));
    };

    let results = combinations
        .into_iter()
        .map(|combination| {
            let mut chosen = combination.into_iter();
            let sequence = fixed
                .iter()
                .map(|slot| match slot {
                    Some(value) => value.clone(),
                    None => chosen.next().unwrap_or(Value::Null),
                })
                .collect();
            Value::Array(sequence)
        })
        .collect();
    Ok(into_resolved_many(results))
}

fn into_resolved_many(results: Vec<Value>) -> Resolved {
    match Versions::new(results) {
        Some(versions) => Resolved::Many(versions),
        None => Resolved::Single(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity(node: Map<String, Value>) -> ExpandResult<Resolved> {
        Ok(Resolved::Single(Value::Object(node)))
    }

    #[test]
    fn scalars_pass_through() {
        let result = recursive_apply(json!(5), &mut identity).unwrap();
        assert_eq!(result, Resolved::Single(json!(5)));
    }

    #[test]
    fn multi_valued_results_are_flattened_in_combination_order() {
        let node = json!({"k": {"$alt": [1, 2]}});
        let mut split = |map: Map<String, Value>| -> ExpandResult<Resolved> {
            match map.get("$alt") {
                Some(Value::Array(items)) => {
                    Ok(Resolved::Many(Versions::new(items.clone()).unwrap()))
                }
                _ => {
                    let doubled = vec![Value::Object(map.clone()), Value::Object(map)];
                    Ok(Resolved::Many(Versions::new(doubled).unwrap()))
                }
            }
        };

        let result = recursive_apply(node, &mut split).unwrap();

        assert_eq!(
            result.into_values(),
            vec![json!({"k": 1}), json!({"k": 1}), json!({"k": 2}), json!({"k": 2})]
        );
    }

    #[test]
    fn sequences_are_rebuilt_positionally() {
        let result = recursive_apply(json!([1, {"a": 2}, "x"]), &mut identity).unwrap();
        assert_eq!(result, Resolved::Single(json!([1, {"a": 2}, "x"])));
    }
}
