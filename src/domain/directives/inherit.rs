use serde_json::{Map, Value};
use tracing::trace;

use super::FROM;
use crate::domain::error::{ExpandError, ExpandResult};
use crate::domain::path::{self, canonical, kind_name, set_nested};
use crate::domain::visitor::{recursive_apply, Resolved};

/// Resolves `$from` against a fixed document.
///
/// The inherited source is resolved for its own `$from` first, then the node's
/// keys are deep-merged over it.
pub struct FromResolver<'c> {
    context: &'c Value,
    stack: Vec<String>,
}

impl<'c> FromResolver<'c> {
    pub fn new(context: &'c Value) -> Self {
        Self {
            context,
            stack: Vec::new(),
        }
    }

    pub fn apply(&mut self, mut node: Map<String, Value>) -> ExpandResult<Resolved> {
        let Some(from) = node.shift_remove(FROM) else {
            return Ok(Resolved::Single(Value::Object(node)));
        };
        let path = match from {
            Value::String(path) => path,
            other => {
                return Err(ExpandError::structure(
                    FROM,
                    format!("expects a path string, found {}", kind_name(&other)),
                    other,
                ))
            }
        };

        let key = canonical(&path);
        if self.stack.contains(&key) {
            return Err(ExpandError::CycleDetected(path));
        }
        let context: &'c Value = self.context;
        let source = path::get(context, &path)?.clone();
        trace!(path = %path, "inheriting");

        self.stack.push(key);
        let resolved = recursive_apply(source, &mut |n| self.apply(n));
        self.stack.pop();

        match resolved? {
            Resolved::Single(Value::Object(source)) => {
                Ok(Resolved::Single(Value::Object(set_nested(source, node))))
            }
            Resolved::Single(other) => Err(ExpandError::structure(
                FROM,
                format!("'{}' must point to a mapping, found {}", path, kind_name(&other)),
                other,
            )),
            Resolved::Many(versions) => Err(ExpandError::structure(
                FROM,
                format!("'{}' must point to a single mapping", path),
                versions,
            )),
        }
    }
}
