//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Broad classification of expansion failures.
///
/// Every [`ExpandError`] maps onto exactly one kind, so callers can react to the
/// category without matching on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A directive or document is malformed.
    Structure,
    /// A path could not be resolved against its context.
    Path,
    /// A node violates a domain-type invariant, or an illegal combination was attempted.
    Invariant,
    /// The expression sublanguage failed.
    Evaluation,
}

/// Errors raised while expanding, classifying or combining configuration trees.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpandError {
    #[error("malformed {directive}: {reason} (in {node})")]
    Structure {
        directive: &'static str,
        reason: String,
        node: String,
    },

    #[error("cannot resolve path '{path}' at '{segment}': {reason}")]
    Path {
        path: String,
        segment: String,
        reason: String,
    },

    #[error("invalid {kind}: {reason}")]
    Invariant { kind: &'static str, reason: String },

    #[error("cannot evaluate '{expression}': {reason}")]
    Evaluation { expression: String, reason: String },

    #[error("cycle detected while resolving '{0}'")]
    CycleDetected(String),
}

impl ExpandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExpandError::Structure { .. } | ExpandError::CycleDetected(_) => ErrorKind::Structure,
            ExpandError::Path { .. } => ErrorKind::Path,
            ExpandError::Invariant { .. } => ErrorKind::Invariant,
            ExpandError::Evaluation { .. } => ErrorKind::Evaluation,
        }
    }

    pub(crate) fn structure(
        directive: &'static str,
        reason: impl Into<String>,
        node: impl std::fmt::Display,
    ) -> Self {
        ExpandError::Structure {
            directive,
            reason: reason.into(),
            node: node.to_string(),
        }
    }

    pub(crate) fn invariant(kind: &'static str, reason: impl Into<String>) -> Self {
        ExpandError::Invariant {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn evaluation(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        ExpandError::Evaluation {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for domain operations.
pub type ExpandResult<T> = Result<T, ExpandError>;
