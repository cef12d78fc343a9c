//! Integration tests for Settings loading with layered precedence.
//!
//! These tests only pass explicit config files; a global config, if one
//! exists on the machine, sits underneath and is overridden where they overlap.

use std::fs;

use tempfile::TempDir;

use runconf::application::ApplicationError;
use runconf::config::{OutputFormat, Settings};

#[test]
fn given_explicit_config_when_load_then_overrides_specified_fields() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("runconf.toml");
    fs::write(
        &path,
        r#"
[output]
format = "yaml"
pretty = false

[expansion]
max_eval_depth = 4
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(&path)).expect("load settings");

    // Assert
    assert_eq!(settings.output.format, OutputFormat::Yaml);
    assert!(!settings.output.pretty);
    assert_eq!(settings.expansion.max_eval_depth, 4);
}

#[test]
fn given_missing_explicit_config_when_load_then_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    // Act
    let result = Settings::load(Some(&path));

    // Assert
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_invalid_toml_when_load_then_error_names_file() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[output\nformat = ").unwrap();

    // Act
    let err = Settings::load(Some(&path)).unwrap_err();

    // Assert
    assert!(err.to_string().contains("broken.toml"), "{}", err);
}

#[test]
fn given_unknown_format_in_config_when_load_then_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("runconf.toml");
    fs::write(&path, "[output]\nformat = \"xml\"\n").unwrap();

    assert!(Settings::load(Some(&path)).is_err());
}
