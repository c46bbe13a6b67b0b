//! Flow controller: run parameters to a finished run.
//!
//! A flow validates its parameters, makes sure the run directory exists,
//! resolves the requested stage names against a registry and hands the
//! resolved stages to a [`PipelineExecutor`]. Anything that goes wrong before
//! the first stage starts is a [`StagelineError`]; everything after is part of
//! the returned [`RunReport`].

use crate::config::ConfigMap;
use crate::core::State;
use crate::errors::{ConfigError, ResolutionError, StagelineError};
use crate::io::StateSource;
use crate::pipeline::{
    PipelineExecutor, Resolution, RunReport, StageRegistry, UnknownStagePolicy,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config key for the run directory.
pub const RUN_DIRECTORY_KEY: &str = "run_directory";
/// Config key for the ordered stage names.
pub const ENGINES_ORDER_KEY: &str = "engines_order";
/// Config key for the unknown-stage policy.
pub const UNKNOWN_STAGES_KEY: &str = "unknown_stages";

/// Parameters of one flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Directory for run output, created if absent.
    pub run_directory: PathBuf,
    /// Stage names, in execution order.
    pub engines_order: Vec<String>,
    /// What to do with names the registry does not know.
    #[serde(default)]
    pub unknown_stages: UnknownStagePolicy,
}

impl FlowConfig {
    /// Creates flow parameters with the default unknown-stage policy.
    #[must_use]
    pub fn new(run_directory: impl Into<PathBuf>, engines_order: Vec<String>) -> Self {
        Self {
            run_directory: run_directory.into(),
            engines_order,
            unknown_stages: UnknownStagePolicy::default(),
        }
    }

    /// Sets the unknown-stage policy.
    #[must_use]
    pub fn with_unknown_stages(mut self, policy: UnknownStagePolicy) -> Self {
        self.unknown_stages = policy;
        self
    }

    /// Reads flow parameters from a merged configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingParameter`] if `run_directory` or
    /// `engines_order` is absent and [`ConfigError::TypeMismatch`] if either
    /// has the wrong shape.
    pub fn from_config(config: &ConfigMap) -> Result<Self, ConfigError> {
        let run_directory = match required(config, RUN_DIRECTORY_KEY)? {
            Value::String(dir) => PathBuf::from(dir),
            _ => return Err(mismatch(RUN_DIRECTORY_KEY, "str")),
        };

        let engines_order = match required(config, ENGINES_ORDER_KEY)? {
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| mismatch(ENGINES_ORDER_KEY, "list of str"))?,
            _ => return Err(mismatch(ENGINES_ORDER_KEY, "list of str")),
        };

        let unknown_stages = match config.get(UNKNOWN_STAGES_KEY) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|_| mismatch(UNKNOWN_STAGES_KEY, "skip or fail_fast"))?,
            None => UnknownStagePolicy::default(),
        };

        Ok(Self {
            run_directory,
            engines_order,
            unknown_stages,
        })
    }

    /// Checks that every parameter is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingParameter`] for an empty run directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run_directory.as_os_str().is_empty() {
            return Err(ConfigError::MissingParameter {
                key: RUN_DIRECTORY_KEY.to_string(),
            });
        }
        Ok(())
    }
}

fn required<'a>(config: &'a ConfigMap, key: &str) -> Result<&'a Value, ConfigError> {
    config.get(key).ok_or_else(|| ConfigError::MissingParameter {
        key: key.to_string(),
    })
}

fn mismatch(field: &str, expected: &str) -> ConfigError {
    ConfigError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
    }
}

/// Drives a flow from parameters to a run report.
#[derive(Debug, Clone)]
pub struct FlowController {
    config: FlowConfig,
    registry: StageRegistry,
}

impl FlowController {
    /// Creates a controller; the registry adopts the flow's unknown-stage
    /// policy.
    #[must_use]
    pub fn new(config: FlowConfig, registry: &StageRegistry) -> Self {
        let registry = registry.with_policy(config.unknown_stages);
        Self { config, registry }
    }

    /// Returns the flow parameters.
    #[must_use]
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Returns the run directory.
    #[must_use]
    pub fn run_directory(&self) -> &Path {
        &self.config.run_directory
    }

    /// Validates parameters and creates the run directory if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingParameter`] for incomplete parameters and
    /// [`ConfigError::RunDirectory`] if the directory cannot be created.
    pub fn prepare(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        debug!("Configuring environment");

        let dir = &self.config.run_directory;
        if dir.is_dir() {
            info!(path = %dir.display(), "Run directory already exists: {}", dir.display());
            return Ok(());
        }

        std::fs::create_dir_all(dir).map_err(|source| ConfigError::RunDirectory {
            path: dir.clone(),
            source,
        })?;
        info!(path = %dir.display(), "Created run directory: {}", dir.display());
        Ok(())
    }

    /// Resolves the configured stage names.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::UnknownStages`] under the fail-fast policy,
    /// and [`ResolutionError::NoStages`] if nothing is left to run.
    pub fn resolve(&self) -> Result<Resolution, ResolutionError> {
        let resolution = self.registry.resolve(&self.config.engines_order)?;
        if resolution.is_empty() {
            return Err(ResolutionError::NoStages);
        }
        Ok(resolution)
    }

    /// Prepares, resolves and runs the flow over `initial`.
    ///
    /// # Errors
    ///
    /// Returns a [`StagelineError`] if the flow fails before any stage runs.
    pub async fn run(
        &self,
        executor: &PipelineExecutor,
        initial: State,
    ) -> Result<RunReport, StagelineError> {
        let resolution = self.setup()?;
        Ok(executor.run(initial, &resolution.stages).await)
    }

    /// Prepares, resolves and runs the flow with the initial state fetched
    /// from `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`StagelineError`] if the flow fails before any stage runs,
    /// including a failed fetch.
    pub async fn run_with_source(
        &self,
        executor: &PipelineExecutor,
        source: &dyn StateSource,
    ) -> Result<RunReport, StagelineError> {
        let resolution = self.setup()?;
        executor.run_from_source(source, &resolution.stages).await
    }

    fn setup(&self) -> Result<Resolution, StagelineError> {
        self.prepare()?;
        let resolution = self.resolve()?;
        info!(
            stages = ?resolution.stage_names(),
            skipped = resolution.skipped.len(),
            "Resolved stages"
        );
        Ok(resolution)
    }
}
