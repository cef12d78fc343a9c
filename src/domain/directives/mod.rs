//! Directive resolvers
//!
//! Each directive is a marker key inside a mapping. Resolvers are plain node
//! transformations meant to be driven by [`recursive_apply`]:
//!
//! - `$from`: inherit from another mapping in the document ([`FromResolver`])
//! - `$each`: enumerate alternatives ([`apply_each`])
//! - `$ref`: replace the node by a value elsewhere in the document ([`RefResolver`])
//! - `$eval`: evaluate an expression ([`EvalResolver`], [`TrialContext`])
//!
//! [`recursive_apply`]: crate::domain::visitor::recursive_apply

mod each;
mod eval;
mod inherit;
mod reference;

use serde_json::{Map, Value};

pub use each::apply_each;
pub use eval::{EvalResolver, TrialContext, DEFAULT_MAX_EVAL_DEPTH};
pub use inherit::FromResolver;
pub use reference::RefResolver;

pub const FROM: &str = "$from";
pub const REF: &str = "$ref";
pub const EACH: &str = "$each";
pub const EVAL: &str = "$eval";

/// `$each` item standing for "the node itself, unchanged".
pub const NONE: &str = "$None";
/// How authors refer to the experiment under evaluation.
pub const TRIAL: &str = "$trial";
/// Name the trial experiment is bound to inside expressions.
pub const TRIAL_TOKEN: &str = "__trial__";

/// True if `value` is an unevaluated `$eval` node.
pub fn is_eval_marker(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.contains_key(EVAL))
}

/// Build an `$eval` node holding `expression`.
pub fn eval_marker(expression: impl Into<String>) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(EVAL.to_string(), Value::String(expression.into()));
    Value::Object(map)
}
