use serde_json::{Map, Value};
use tracing::trace;

use super::REF;
use crate::domain::error::{ExpandError, ExpandResult};
use crate::domain::path::{self, canonical, kind_name};
use crate::domain::visitor::{recursive_apply, Resolved};

/// Resolves `$ref` nodes against one concrete document.
///
/// Referenced values are themselves resolved, so chains of references collapse
/// to their final target.
pub struct RefResolver<'c> {
    context: &'c Value,
    stack: Vec<String>,
}

impl<'c> RefResolver<'c> {
    pub fn new(context: &'c Value) -> Self {
        Self {
            context,
            stack: Vec::new(),
        }
    }

    pub fn apply(&mut self, node: Map<String, Value>) -> ExpandResult<Resolved> {
        let path = match node.get(REF) {
            None => return Ok(Resolved::Single(Value::Object(node))),
            Some(_) if node.len() != 1 => {
                return Err(ExpandError::structure(
                    REF,
                    "must be the only key in its mapping",
                    Value::Object(node),
                ))
            }
            Some(Value::String(path)) => path.clone(),
            Some(other) => {
                return Err(ExpandError::structure(
                    REF,
                    format!("expects a path string, found {}", kind_name(other)),
                    Value::Object(node),
                ))
            }
        };

        let key = canonical(&path);
        if self.stack.contains(&key) {
            return Err(ExpandError::CycleDetected(path));
        }
        let context: &'c Value = self.context;
        let target = path::get(context, &path)?.clone();
        trace!(path = %path, "following reference");

        self.stack.push(key);
        let resolved = recursive_apply(target, &mut |n| self.apply(n));
        self.stack.pop();
        resolved
    }
}
