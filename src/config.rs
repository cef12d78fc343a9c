//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/runconf/runconf.toml`
//! 3. Explicit config file passed with `--config`
//! 4. Environment variables: `RUNCONF_*` prefix, `__` between sections

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::directives::DEFAULT_MAX_EVAL_DEPTH;

/// Serialization used when printing documents.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(ApplicationError::Config {
                message: format!("unknown output format '{}' (expected json or yaml)", other),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Indent JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            pretty: true,
        }
    }
}

/// Expansion settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Bound on re-evaluating an `$eval` result that is itself an `$eval`
    pub max_eval_depth: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub output: RawOutputConfig,
    pub expansion: RawExpansionConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOutputConfig {
    pub format: Option<OutputFormat>,
    pub pretty: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawExpansionConfig {
    pub max_eval_depth: Option<usize>,
}

/// Unified configuration for runconf.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub output: OutputConfig,
    pub expansion: ExpansionConfig,
}

/// Get the XDG config directory for runconf.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "runconf").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("runconf.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            output: OutputConfig {
                format: overlay.output.format.unwrap_or(self.output.format),
                pretty: overlay.output.pretty.unwrap_or(self.output.pretty),
            },
            expansion: ExpansionConfig {
                max_eval_depth: overlay
                    .expansion
                    .max_eval_depth
                    .unwrap_or(self.expansion.max_eval_depth),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - Config file given on the command line; must exist if given
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(path) = explicit {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        Self::apply_env_overrides(current)
    }

    /// Apply RUNCONF_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("RUNCONF")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("output.format") {
            settings.output.format = val.parse()?;
        }
        if let Ok(val) = config.get_bool("output.pretty") {
            settings.output.pretty = val;
        }
        if let Ok(val) = config.get_int("expansion.max_eval_depth") {
            settings.expansion.max_eval_depth =
                usize::try_from(val).map_err(|_| ApplicationError::Config {
                    message: format!("expansion.max_eval_depth must not be negative: {}", val),
                })?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# runconf configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/runconf/runconf.toml
#   Explicit: runconf --config <file>
#   Env:      RUNCONF_* environment variables, e.g. RUNCONF_OUTPUT__FORMAT=yaml

[output]
# Serialization of printed documents: "json" or "yaml"
# format = "json"

# Indent JSON output
# pretty = true

[expansion]
# How often an $eval result may itself be an $eval before giving up
# max_eval_depth = 32
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_json_pretty_and_default_depth() {
        let settings = Settings::default();
        assert_eq!(settings.output.format, OutputFormat::Json);
        assert!(settings.output.pretty);
        assert_eq!(settings.expansion.max_eval_depth, DEFAULT_MAX_EVAL_DEPTH);
    }

    #[test]
    fn given_partial_overlay_when_merging_then_only_specified_fields_change() {
        let base = Settings::default();
        let overlay = RawSettings {
            output: RawOutputConfig {
                format: Some(OutputFormat::Yaml),
                pretty: None,
            },
            expansion: RawExpansionConfig::default(),
        };

        let result = base.merge_with(&overlay);

        assert_eq!(result.output.format, OutputFormat::Yaml);
        assert!(result.output.pretty);
        assert_eq!(result.expansion.max_eval_depth, DEFAULT_MAX_EVAL_DEPTH);
    }

    #[test]
    fn given_yml_alias_when_parsing_format_then_yaml() {
        assert_eq!("YML".parse::<OutputFormat>().ok(), Some(OutputFormat::Yaml));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("valid template");
        assert!(raw.output.format.is_none());
        assert!(raw.expansion.max_eval_depth.is_none());
    }

    #[test]
    fn given_settings_when_serialized_then_round_trips_through_toml() {
        let settings = Settings::default();
        let text = settings.to_toml().expect("serialize");
        let parsed: Settings = toml::from_str(&text).expect("parse");
        assert_eq!(parsed, settings);
    }
}
