//! Expansion pipeline
//!
//! Directives are resolved over the whole document in a fixed order:
//!
//! 1. `$from`, against the original document
//! 2. `$eval` (pre-trial), against the document after inheritance
//! 3. `$each`, the only stage that multiplies documents
//! 4. `$ref`, separately for every concrete document, against that document

use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::classify::ExpandedConfig;
use crate::domain::directives::{
    apply_each, EvalResolver, FromResolver, RefResolver, DEFAULT_MAX_EVAL_DEPTH,
};
use crate::domain::error::{ExpandError, ExpandResult};
use crate::domain::visitor::{recursive_apply, Resolved};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    max_eval_depth: usize,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
        }
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_eval_depth(mut self, max_eval_depth: usize) -> Self {
        self.max_eval_depth = max_eval_depth;
        self
    }

    pub fn max_eval_depth(&self) -> usize {
        self.max_eval_depth
    }

    /// Resolve every directive in `document`, one output per enumerated variant.
    #[instrument(level = "debug", skip_all)]
    pub fn expand(&self, document: Value) -> ExpandResult<Vec<Value>> {
        let context = document.clone();
        let mut inherit = FromResolver::new(&context);
        let document = single(recursive_apply(document, &mut |n| inherit.apply(n))?, "$from")?;

        let context = document.clone();
        let mut eval = EvalResolver::pre_trial(&context).with_max_depth(self.max_eval_depth);
        let document = single(recursive_apply(document, &mut |n| eval.apply(n))?, "$eval")?;

        let documents = recursive_apply(document, &mut apply_each)?.into_values();
        debug!(count = documents.len(), "enumerated documents");

        let resolved = documents
            .into_par_iter()
            .map(|document| {
                let context = document.clone();
                let mut references = RefResolver::new(&context);
                recursive_apply(document, &mut |n| references.apply(n)).map(Resolved::into_values)
            })
            .collect::<ExpandResult<Vec<_>>>()?;
        Ok(resolved.into_iter().flatten().collect())
    }

    /// Expand `document`, then classify and aggregate its top-level values.
    pub fn load(&self, document: Value) -> ExpandResult<ExpandedConfig> {
        ExpandedConfig::aggregate(self.expand(document)?)
    }
}

fn single(resolved: Resolved, stage: &'static str) -> ExpandResult<Value> {
    match resolved {
        Resolved::Single(value) => Ok(value),
        Resolved::Many(versions) => Err(ExpandError::structure(
            stage,
            "produced several versions before enumeration",
            versions,
        )),
    }
}

/// Expand `document` with default settings.
pub fn expand(document: Value) -> ExpandResult<Vec<Value>> {
    Pipeline::default().expand(document)
}

/// Expand, classify and aggregate `document` with default settings.
pub fn transform_config(document: Value) -> ExpandResult<ExpandedConfig> {
    Pipeline::default().load(document)
}
