//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use std::io::{self, Write};

use colored::Colorize;
use serde::Serialize;

use crate::config::{OutputConfig, OutputFormat};
use crate::infrastructure::{InfraError, InfraResult};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Write rendered data to stdout; a closed pipe is reported instead of panicking.
pub fn emit(text: &str) -> InfraResult<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", text)
        .and_then(|_| stdout.flush())
        .map_err(|e| InfraError::io("write output", e))
}

/// Serialize `value` as configured.
pub fn render<T: Serialize + ?Sized>(value: &T, output: &OutputConfig) -> InfraResult<String> {
    let rendered = match (output.format, output.pretty) {
        (OutputFormat::Json, true) => serde_json::to_string_pretty(value).map_err(output_err)?,
        (OutputFormat::Json, false) => serde_json::to_string(value).map_err(output_err)?,
        (OutputFormat::Yaml, _) => serde_yaml::to_string(value).map_err(output_err)?,
    };
    Ok(rendered.trim_end().to_string())
}

fn output_err(e: impl std::fmt::Display) -> InfraError {
    InfraError::Output {
        message: e.to_string(),
    }
}
