//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::config::OutputFormat;

/// Expand declarative experiment configs into every concrete algorithm x dataset job
#[derive(Parser, Debug)]
#[command(name = "runconf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Settings file, layered over the global one
    #[arg(long, global = true, env = "RUNCONF_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output format (overrides settings)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every concrete document a config expands to
    Expand {
        /// Config file (YAML or JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show the classified configuration as a tree
    Show {
        /// Config file (YAML or JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Multiply two top-level entries into experiments
    Experiments {
        /// Config file (YAML or JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Top-level key of the outer operand
        left: String,
        /// Top-level key of the inner operand
        right: String,
        /// Job name expression, evaluated per experiment and run (e.g. "$trial.algorithm.image + '-' + str(run)")
        #[arg(short, long)]
        name: Option<String>,
        /// Runs per experiment (bound as `run` in the name expression)
        #[arg(short, long, default_value_t = 1)]
        runs: usize,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}
