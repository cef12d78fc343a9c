//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::tree::ToTree;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::Experiment;
use crate::infrastructure::di::ServiceContainer;

/// Names of the runs of one experiment.
#[derive(Debug, Serialize)]
struct Job<'a> {
    names: &'a [String],
    experiment: &'a Experiment,
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(format) = cli.format {
        settings.output.format = format;
    }
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Some(Commands::Expand { file }) => _expand(&container, file),
        Some(Commands::Show { file }) => _show(&container, file),
        Some(Commands::Experiments {
            file,
            left,
            right,
            name,
            runs,
        }) => _experiments(&container, file, left, right, name.as_deref(), *runs),
        Some(Commands::Config { command }) => _config(&container, cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let bin = cmd.get_name().to_string();
            generate(*shell, &mut cmd, bin, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `runconf --help`".to_string(),
        )),
    }
}

#[instrument(skip(container))]
fn _expand(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let documents = container.config_service.expand_file(file)?;
    debug!("expand: {} documents", documents.len());
    output::emit(&output::render(&documents, &container.settings.output)?)?;
    Ok(())
}

#[instrument(skip(container))]
fn _show(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let config = container.config_service.load_file(file)?;
    if config.is_empty() {
        output::warning(&format!("{} has no top-level keys", file.display()));
    }
    output::info(&config.to_tree(&file.display().to_string()));
    Ok(())
}

#[instrument(skip(container))]
fn _experiments(
    container: &ServiceContainer,
    file: &Path,
    left: &str,
    right: &str,
    name: Option<&str>,
    runs: usize,
) -> CliResult<()> {
    let service = &container.config_service;
    let experiments = service.experiments(file, left, right)?;

    let Some(expression) = name else {
        output::emit(&output::render(&experiments, &container.settings.output)?)?;
        return Ok(());
    };

    if runs == 0 {
        return Err(CliError::InvalidArgs("--runs must be at least 1".to_string()));
    }
    let names = service.job_names(&experiments, expression, runs)?;
    let jobs = experiments
        .iter()
        .zip(names.chunks(runs))
        .map(|(experiment, names)| Job { names, experiment })
        .collect::<Vec<_>>();
    debug!("experiments: {} jobs", names.len());
    output::emit(&output::render(&jobs, &container.settings.output)?)?;
    Ok(())
}

fn _config(container: &ServiceContainer, cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
        }
        ConfigCommands::Path => {
            output::header("Settings files");
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".to_string());
            output::action("global", &global);
            if let Some(explicit) = &cli.config {
                output::action("explicit", &explicit.display());
            }
        }
    }
    Ok(())
}
