//! Tests for command-line parsing and exit codes

use clap::Parser;
use rstest::rstest;

use runconf::cli::args::ConfigCommands;
use runconf::cli::{Cli, CliError, Commands};
use runconf::config::OutputFormat;
use runconf::exitcode;

#[test]
fn given_experiments_command_when_parsing_then_defaults_to_one_run() {
    // Act
    let cli = Cli::try_parse_from(["runconf", "experiments", "sweep.yaml", "algos", "data"]).unwrap();

    // Assert
    match cli.command {
        Some(Commands::Experiments {
            file,
            left,
            right,
            name,
            runs,
        }) => {
            assert_eq!(file.to_str(), Some("sweep.yaml"));
            assert_eq!((left.as_str(), right.as_str()), ("algos", "data"));
            assert!(name.is_none());
            assert_eq!(runs, 1);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn given_global_flags_after_subcommand_when_parsing_then_applied() {
    // Act
    let cli = Cli::try_parse_from([
        "runconf", "expand", "sweep.yaml", "-f", "yaml", "-dd", "--config", "custom.toml",
    ])
    .unwrap();

    // Assert
    assert_eq!(cli.format, Some(OutputFormat::Yaml));
    assert_eq!(cli.debug, 2);
    assert_eq!(cli.config.as_deref().and_then(|p| p.to_str()), Some("custom.toml"));
}

#[test]
fn given_name_and_runs_when_parsing_then_captured() {
    let cli = Cli::try_parse_from([
        "runconf",
        "experiments",
        "sweep.yaml",
        "algos",
        "data",
        "--name",
        "str(run)",
        "-r",
        "3",
    ])
    .unwrap();

    assert!(matches!(
        cli.command,
        Some(Commands::Experiments { name: Some(ref n), runs: 3, .. }) if n == "str(run)"
    ));
}

#[test]
fn given_config_path_subcommand_when_parsing_then_recognized() {
    let cli = Cli::try_parse_from(["runconf", "config", "path"]).unwrap();

    assert!(matches!(
        cli.command,
        Some(Commands::Config { command: ConfigCommands::Path })
    ));
}

#[rstest]
#[case(&["runconf", "experiments", "sweep.yaml", "algos"])]
#[case(&["runconf", "expand"])]
#[case(&["runconf", "expand", "x.yaml", "--format", "xml"])]
#[case(&["runconf", "experiments", "s.yaml", "a", "b", "--runs", "-1"])]
fn given_invalid_arguments_when_parsing_then_rejected(#[case] args: &[&str]) {
    assert!(Cli::try_parse_from(args).is_err());
}

#[test]
fn given_usage_error_when_mapping_exit_code_then_usage() {
    let err = CliError::InvalidArgs("--runs must be at least 1".into());
    assert_eq!(err.exit_code(), exitcode::USAGE);
}
