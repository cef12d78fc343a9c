//! Domain layer: configuration expansion and typed nodes
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod algebra;
pub mod classify;
pub mod directives;
pub mod entities;
pub mod error;
pub mod expr;
pub mod path;
pub mod pipeline;
pub mod versions;
pub mod visitor;

pub use classify::{Entry, ExpandedConfig, Typed};
pub use directives::TrialContext;
pub use entities::*;
pub use error::{ErrorKind, ExpandError, ExpandResult};
pub use pipeline::{expand, transform_config, Pipeline};
pub use versions::Versions;
pub use visitor::{recursive_apply, Resolved};
