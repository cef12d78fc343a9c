//! Path access into configuration trees
//!
//! Paths are dot-separated keys (`a.b.0`) with optional bracketed segments
//! (`a[0]`, `a["key"]`, `a['key']`). A segment indexes a mapping by its literal
//! text and a sequence by its integer value; negative integers count from the end.

use serde_json::{Map, Value};

use crate::domain::error::{ExpandError, ExpandResult};

/// One parsed path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Key text with brackets and quotes removed
    pub key: String,
    /// Byte offset in the source path just past this segment
    pub end: usize,
}

/// Split a path into its segments.
pub fn parse_path(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '.' => {
                if !current.is_empty() {
                    segments.push(Segment {
                        key: std::mem::take(&mut current),
                        end: offset,
                    });
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(Segment {
                        key: std::mem::take(&mut current),
                        end: offset,
                    });
                }
                let mut inner = String::new();
                let mut end = path.len();
                for (pos, c) in chars.by_ref() {
                    if c == ']' {
                        end = pos + 1;
                        break;
                    }
                    inner.push(c);
                }
                segments.push(Segment {
                    key: strip_quotes(&inner).to_string(),
                    end,
                });
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        segments.push(Segment {
            key: current,
            end: path.len(),
        });
    }
    segments
}

/// Normal form of a path, so `a[0]` and `a.0` compare equal.
pub(crate) fn canonical(path: &str) -> String {
    parse_path(path)
        .into_iter()
        .map(|segment| segment.key)
        .collect::<Vec<_>>()
        .join(".")
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        return &s[1..s.len() - 1];
    }
    s
}

/// Read the value at `path` inside `tree`.
///
/// Fails with a path error naming the first segment that cannot be followed.
pub fn get<'a>(tree: &'a Value, path: &str) -> ExpandResult<&'a Value> {
    let segments = parse_path(path);
    if segments.is_empty() {
        return Err(ExpandError::Path {
            path: path.to_string(),
            segment: String::new(),
            reason: "empty path".to_string(),
        });
    }

    let mut current = tree;
    for segment in &segments {
        current = step(current, &segment.key).map_err(|reason| ExpandError::Path {
            path: path.to_string(),
            segment: segment.key.clone(),
            reason,
        })?;
    }
    Ok(current)
}

/// Follow a single segment from `node`.
pub(crate) fn step<'a>(node: &'a Value, key: &str) -> Result<&'a Value, String> {
    match node {
        Value::Object(map) => map
            .get(key)
            .ok_or_else(|| format!("no key '{}' in mapping", key)),
        Value::Array(items) => {
            let index: i64 = key.parse().map_err(|_| {
                format!("expected an integer index into a sequence, got '{}'", key)
            })?;
            resolve_index(index, items.len())
                .and_then(|i| items.get(i))
                .ok_or_else(|| {
                    format!("index {} out of range for {} items", index, items.len())
                })
        }
        other => Err(format!("cannot index into a {}", kind_name(other))),
    }
}

/// Translate a possibly negative index into a position within `len` items.
pub(crate) fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let position = if index < 0 { len + index } else { index };
    if (0..len).contains(&position) {
        usize::try_from(position).ok()
    } else {
        None
    }
}

/// Human-readable name of a node's shape, used in error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "mapping",
        Value::Array(_) => "sequence",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
    }
}

/// Deep-merge `overlay` into `base`.
///
/// Where both sides hold a mapping for the same key the merge recurses; in every
/// other case the overlay value replaces the base value wholesale. Keys keep the
/// position they had in `base`; new keys are appended in overlay order.
pub fn set_nested(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, incoming) in overlay {
        let both_mappings = matches!(base.get(&key), Some(Value::Object(_))) && incoming.is_object();
        if both_mappings {
            if let (Some(Value::Object(existing)), Value::Object(patch)) =
                (base.get_mut(&key), incoming)
            {
                let merged = set_nested(std::mem::take(existing), patch);
                *existing = merged;
            }
        } else {
            base.insert(key, incoming);
        }
    }
    base
}
