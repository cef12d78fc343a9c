//! Configuration file service
//!
//! Reads experiment configuration files and runs them through the expansion pipeline.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{ExpandedConfig, Experiment, Experiments, Pipeline, TrialContext};
use crate::infrastructure::traits::FileSystem;

/// Serialization of a configuration file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` is JSON, everything else is read as YAML (a superset of JSON).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }

    pub fn parse(self, content: &str) -> Result<Value, String> {
        match self {
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Service for loading and expanding configuration files.
pub struct ConfigService {
    fs: Arc<dyn FileSystem>,
    pipeline: Pipeline,
}

impl ConfigService {
    /// Create a new config service with default pipeline settings.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self::with_pipeline(fs, Pipeline::default())
    }

    pub fn with_pipeline(fs: Arc<dyn FileSystem>, pipeline: Pipeline) -> Self {
        Self { fs, pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Read and parse a configuration file without expanding it.
    pub fn read_document(&self, path: &Path) -> ApplicationResult<Value> {
        debug!("read_document: path={}", path.display());
        if !self.fs.exists(path) {
            return Err(ApplicationError::NotFound(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read config", path)?;

        let format = DocumentFormat::from_path(path);
        format
            .parse(&content)
            .map_err(|message| ApplicationError::Parse {
                path: path.to_path_buf(),
                message,
            })
    }

    /// Every concrete document the file expands to, in enumeration order.
    #[instrument(level = "debug", skip(self))]
    pub fn expand_file(&self, path: &Path) -> ApplicationResult<Vec<Value>> {
        let document = self.read_document(path)?;
        let documents = self.pipeline.expand(document)?;
        debug!("expand_file: {} documents", documents.len());
        Ok(documents)
    }

    /// Expand, classify and aggregate the file.
    #[instrument(level = "debug", skip(self))]
    pub fn load_file(&self, path: &Path) -> ApplicationResult<ExpandedConfig> {
        let document = self.read_document(path)?;
        Ok(self.pipeline.load(document)?)
    }

    /// Multiply the entries under `left` and `right` and finish every
    /// expression deferred to the trial.
    pub fn experiments(
        &self,
        path: &Path,
        left: &str,
        right: &str,
    ) -> ApplicationResult<Experiments> {
        debug!("experiments: left={}, right={}", left, right);
        let config = self.load_file(path)?;
        let experiments = config.multiply(left, right)?;

        let resolved = experiments
            .iter()
            .map(|experiment| self.trial(experiment).resolve(experiment))
            .collect::<Result<Vec<Experiment>, _>>()?;
        debug!("experiments: resolved {}", resolved.len());
        Ok(Experiments::new(resolved)?)
    }

    /// Evaluate `expression` once per experiment and run, binding the run index as `run`.
    ///
    /// Names are ordered experiment first, then run.
    pub fn job_names(
        &self,
        experiments: &Experiments,
        expression: &str,
        runs: usize,
    ) -> ApplicationResult<Vec<String>> {
        let mut names = Vec::with_capacity(experiments.len() * runs);
        for experiment in experiments.iter() {
            for run in 0..runs {
                let name = self
                    .trial(experiment)
                    .bind("run", run)
                    .evaluate(expression)?;
                names.push(match name {
                    Value::String(text) => text,
                    other => other.to_string(),
                });
            }
        }
        Ok(names)
    }

    fn trial(&self, experiment: &Experiment) -> TrialContext {
        TrialContext::new(experiment).with_max_depth(self.pipeline.max_eval_depth())
    }
}
