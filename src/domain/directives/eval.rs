//! `$eval` resolution in two passes.
//!
//! The pre-trial pass runs during expansion. References of the form `$.path`
//! are replaced by the literal they point to in the document, then the
//! expression is evaluated. Expressions that need the trial experiment cannot
//! be finished yet and stay behind as `$eval` nodes with their references
//! already substituted.
//!
//! The trial pass ([`TrialContext`]) runs once an algorithm and a dataset have
//! been paired into an [`Experiment`]. It binds that experiment and finishes
//! the remaining expressions.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::{eval_marker, is_eval_marker, EVAL, TRIAL, TRIAL_TOKEN};
use crate::domain::entities::Experiment;
use crate::domain::error::{ExpandError, ExpandResult};
use crate::domain::expr::{evaluate, Scope};
use crate::domain::path::{canonical, parse_path, step};
use crate::domain::visitor::{recursive_apply, Resolved};

/// How many times an expression may evaluate to another expression.
pub const DEFAULT_MAX_EVAL_DEPTH: usize = 32;

lazy_static! {
    // $.key, $[0], $["key"], $['key'], chained
    static ref CONTEXT_REF: Regex =
        Regex::new(r#"\$(?:\[\d+\]|\["[\w$]+"\]|\['[\w$]+'\]|\.\w+)+"#).expect("valid regex");
    // __trial__.key, __trial__[0], ... chained
    static ref TRIAL_REF: Regex =
        Regex::new(r#"__trial__(?:\[\d+\]|\["[\w$]+"\]|\['[\w$]+'\]|\.\w+)+"#)
            .expect("valid regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    PreTrial,
    Trial,
}

/// Resolves `$eval` nodes against a root value.
pub struct EvalResolver<'r> {
    root: &'r Value,
    scope: Scope<'r>,
    pass: Pass,
    max_depth: usize,
    stack: Vec<String>,
}

impl<'r> EvalResolver<'r> {
    /// Resolver for the expansion pass; `document` is the whole configuration.
    pub fn pre_trial(document: &'r Value) -> Self {
        Self::new(document, Pass::PreTrial)
    }

    fn trial(bindings: &'r Value) -> Self {
        Self::new(bindings, Pass::Trial)
    }

    fn new(root: &'r Value, pass: Pass) -> Self {
        let scope = match root {
            Value::Object(map) => Scope::new().with_layer(map),
            _ => Scope::new(),
        };
        Self {
            root,
            scope,
            pass,
            max_depth: DEFAULT_MAX_EVAL_DEPTH,
            stack: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn apply(&mut self, node: Map<String, Value>) -> ExpandResult<Resolved> {
        self.apply_at_depth(node, 0)
    }

    fn apply_at_depth(&mut self, node: Map<String, Value>, depth: usize) -> ExpandResult<Resolved> {
        let expression = match node.get(EVAL) {
            None => return Ok(Resolved::Single(Value::Object(node))),
            Some(_) if node.len() != 1 => {
                return Err(ExpandError::structure(
                    EVAL,
                    "must be the only key in its mapping",
                    Value::Object(node),
                ))
            }
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        };
        self.evaluate_text(&expression, depth).map(Resolved::Single)
    }

    fn evaluate_text(&mut self, expression: &str, depth: usize) -> ExpandResult<Value> {
        if depth > self.max_depth {
            return Err(ExpandError::evaluation(
                expression,
                format!("still an expression after {} re-evaluations", self.max_depth),
            ));
        }
        let text = expression.replace(TRIAL, TRIAL_TOKEN);
        let text = self.substitute(&text)?;
        trace!(expression = %text, depth, "evaluating");

        match evaluate(&text, &self.scope) {
            Ok(value) if is_eval_marker(&value) => match value {
                Value::Object(node) => match self.apply_at_depth(node, depth + 1)? {
                    Resolved::Single(value) => Ok(value),
                    Resolved::Many(versions) => Ok(Value::Array(versions.into_vec())),
                },
                other => Ok(other),
            },
            Ok(value) => Ok(value),
            Err(e) if self.pass == Pass::PreTrial && e.is_unbound(TRIAL_TOKEN) => {
                debug!(expression = %text, "deferring until a trial is bound");
                Ok(eval_marker(text))
            }
            Err(e) => Err(ExpandError::evaluation(text, e.to_string())),
        }
    }

    /// Replace every reference in `text` by the literal it points to.
    fn substitute(&mut self, text: &str) -> ExpandResult<String> {
        let pattern: &Regex = match self.pass {
            Pass::PreTrial => &*CONTEXT_REF,
            Pass::Trial => &*TRIAL_REF,
        };
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for found in pattern.find_iter(text) {
            out.push_str(&text[last..found.start()]);
            out.push_str(&self.substitute_reference(found.as_str())?);
            last = found.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }

    /// Resolve the longest prefix of `reference` that exists under the root and
    /// render it; the unresolved remainder (e.g. `.split`) is kept verbatim.
    fn substitute_reference(&mut self, reference: &str) -> ExpandResult<String> {
        let path = match self.pass {
            Pass::PreTrial => &reference[1..],
            Pass::Trial => reference,
        };
        let root: &'r Value = self.root;
        let mut current = root;
        let mut consumed = 0;
        for segment in parse_path(path) {
            match step(current, &segment.key) {
                Ok(next) => {
                    current = next;
                    consumed = segment.end;
                }
                Err(reason) if consumed == 0 => {
                    return Err(ExpandError::Path {
                        path: reference.to_string(),
                        segment: segment.key,
                        reason,
                    })
                }
                Err(_) => break,
            }
        }
        let (resolved_path, remainder) = path.split_at(consumed);

        let key = canonical(resolved_path);
        if self.stack.contains(&key) {
            return Err(ExpandError::CycleDetected(resolved_path.to_string()));
        }
        self.stack.push(key);
        let resolved = recursive_apply(current.clone(), &mut |n| self.apply(n));
        self.stack.pop();

        let value = match resolved? {
            Resolved::Single(value) => value,
            Resolved::Many(versions) => Value::Array(versions.into_vec()),
        };
        // Only the pre-trial pass can leave a marker behind; in the trial pass
        // nested markers were evaluated by the recursion above or failed there.
        let literal = match &value {
            Value::Object(node) if is_eval_marker(&value) => {
                format!("({})", expression_text(node))
            }
            _ => value.to_string(),
        };
        Ok(format!("{}{}", literal, remainder))
    }
}

fn expression_text(node: &Map<String, Value>) -> String {
    match node.get(EVAL) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Binds a concrete experiment for the trial pass.
///
/// ```
/// # use runconf::domain::{Experiment, TrialContext};
/// # use serde_json::json;
/// let experiment = Experiment::try_from(json!({
///     "algorithm": {"image": "img", "instance": "ml.m5.large"},
///     "dataset": {"path": {"train": "s3://bucket/train"}, "meta": {"name": "electricity"}},
/// }))
/// .unwrap();
/// let name = TrialContext::new(&experiment)
///     .bind("run", 3)
///     .evaluate("$trial.dataset.meta.name + '-' + str(run)")
///     .unwrap();
/// assert_eq!(name, json!("electricity-3"));
/// ```
#[derive(Debug, Clone)]
pub struct TrialContext {
    bindings: Value,
    max_depth: usize,
}

impl TrialContext {
    pub fn new(experiment: &Experiment) -> Self {
        let mut bindings = Map::new();
        bindings.insert(
            TRIAL_TOKEN.to_string(),
            Value::Object(experiment.as_plain_mapping()),
        );
        Self {
            bindings: Value::Object(bindings),
            max_depth: DEFAULT_MAX_EVAL_DEPTH,
        }
    }

    /// Make `name` visible to expressions evaluated in this context.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Value::Object(bindings) = &mut self.bindings {
            bindings.insert(name.into(), value.into());
        }
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Finish every deferred expression inside `experiment`.
    pub fn resolve(&self, experiment: &Experiment) -> ExpandResult<Experiment> {
        let tree = Value::Object(experiment.as_plain_mapping());
        let mut resolver = self.resolver();
        match recursive_apply(tree, &mut |n| resolver.apply(n))? {
            Resolved::Single(value) => Experiment::try_from(value),
            Resolved::Many(versions) => Err(ExpandError::invariant(
                "experiment",
                format!("trial resolution produced several versions: {}", versions),
            )),
        }
    }

    /// Evaluate a standalone expression against the trial.
    pub fn evaluate(&self, expression: &str) -> ExpandResult<Value> {
        self.resolver().evaluate_text(expression, 0)
    }

    /// Apply the trial pass to a single node.
    pub fn apply(&self, node: Map<String, Value>) -> ExpandResult<Resolved> {
        self.resolver().apply(node)
    }

    fn resolver(&self) -> EvalResolver<'_> {
        EvalResolver::trial(&self.bindings).with_max_depth(self.max_depth)
    }
}
