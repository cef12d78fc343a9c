//! Expression sublanguage used by `$eval`
//!
//! Expressions are parsed into an [`Expr`] tree and evaluated over
//! `serde_json::Value`. Only allow-listed operators, functions and methods
//! exist; nothing reaches the host.

mod eval;
mod parser;

use thiserror::Error;

pub use eval::{evaluate, Scope};
pub use parser::{parse, BinaryOp, Expr, UnaryOp};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("name '{0}' is not defined")]
    UnknownName(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("{0}")]
    Invalid(String),
}

impl EvalError {
    /// True when evaluation failed only because `name` was not bound.
    pub fn is_unbound(&self, name: &str) -> bool {
        matches!(self, EvalError::UnknownName(n) if n == name)
    }
}
