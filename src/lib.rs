//! Expansion of declarative experiment configurations
//!
//! A configuration file is a tree carrying directives (`$from`, `$eval`,
//! `$each`, `$ref`). Expanding it yields every concrete document; classifying
//! those yields typed algorithms, datasets and experiments that can be added and
//! multiplied into the jobs to run.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{expand, transform_config, ExpandError, ExpandResult, ExpandedConfig, Pipeline};
