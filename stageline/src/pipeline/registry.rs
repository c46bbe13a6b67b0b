//! Stage registry: name to stage lookup.

use crate::core::State;
use crate::errors::{ResolutionError, StageError};
use crate::stages::Stage;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// What to do with a requested stage name that is not registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownStagePolicy {
    /// Warn and drop the name, running the rest.
    #[default]
    Skip,
    /// Refuse to resolve if any name is unknown.
    FailFast,
}

/// Stages resolved from a list of names.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Resolved stages, in request order.
    pub stages: Vec<Arc<dyn Stage>>,
    /// Names that were not registered and were skipped.
    pub skipped: Vec<String>,
}

impl Resolution {
    /// Returns the names of the resolved stages.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns true if nothing resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// A stage registered under a name other than its own.
#[derive(Debug)]
struct AliasedStage {
    alias: String,
    inner: Arc<dyn Stage>,
}

#[async_trait]
impl Stage for AliasedStage {
    fn name(&self) -> &str {
        &self.alias
    }

    async fn process(&self, state: State) -> Result<State, StageError> {
        self.inner.process(state).await
    }
}

/// Builder for a [`StageRegistry`].
#[derive(Debug, Clone, Default)]
pub struct StageRegistryBuilder {
    stages: IndexMap<String, Arc<dyn Stage>>,
    policy: UnknownStagePolicy,
}

impl StageRegistryBuilder {
    /// Creates a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stage under its own name.
    ///
    /// A later registration with the same name replaces the earlier one.
    #[must_use]
    pub fn register(self, stage: Arc<dyn Stage>) -> Self {
        let name = stage.name().to_string();
        self.register_as(name, stage)
    }

    /// Registers a stage under an explicit name.
    ///
    /// When `name` differs from the stage's own name, the stage is wrapped so
    /// that runs log, record and report it under `name`.
    #[must_use]
    pub fn register_as(mut self, name: impl Into<String>, stage: Arc<dyn Stage>) -> Self {
        let name = name.into();
        let stage = if stage.name() == name {
            stage
        } else {
            Arc::new(AliasedStage {
                alias: name.clone(),
                inner: stage,
            })
        };
        if self.stages.insert(name.clone(), stage).is_some() {
            debug!(stage = %name, "Replacing previously registered stage");
        }
        self
    }

    /// Sets the unknown-name policy.
    #[must_use]
    pub fn with_policy(mut self, policy: UnknownStagePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> StageRegistry {
        StageRegistry {
            stages: Arc::new(self.stages),
            policy: self.policy,
        }
    }
}

/// An immutable mapping from stage name to stage implementation.
///
/// Cloning is cheap; clones share the same stages.
#[derive(Debug, Clone, Default)]
pub struct StageRegistry {
    stages: Arc<IndexMap<String, Arc<dyn Stage>>>,
    policy: UnknownStagePolicy,
}

impl StageRegistry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> StageRegistryBuilder {
        StageRegistryBuilder::new()
    }

    /// Returns a copy of this registry using a different unknown-name policy.
    #[must_use]
    pub fn with_policy(&self, policy: UnknownStagePolicy) -> Self {
        Self {
            stages: Arc::clone(&self.stages),
            policy,
        }
    }

    /// Returns the unknown-name policy.
    #[must_use]
    pub fn policy(&self) -> UnknownStagePolicy {
        self.policy
    }

    /// Gets a stage by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Stage>> {
        self.stages.get(name).cloned()
    }

    /// Returns true if a stage is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.stages.contains_key(name)
    }

    /// Lists registered names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.stages.keys().map(String::as_str).collect()
    }

    /// Returns the number of registered stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Resolves an ordered list of names into stages.
    ///
    /// Repeated names resolve to the same stage each time they appear.
    ///
    /// # Errors
    ///
    /// With [`UnknownStagePolicy::FailFast`], returns
    /// [`ResolutionError::UnknownStages`] listing every unknown name.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Resolution, ResolutionError> {
        let mut resolution = Resolution::default();

        for name in names {
            let name = name.as_ref();
            match self.stages.get(name) {
                Some(stage) => resolution.stages.push(Arc::clone(stage)),
                None => resolution.skipped.push(name.to_string()),
            }
        }

        if resolution.skipped.is_empty() {
            return Ok(resolution);
        }

        match self.policy {
            UnknownStagePolicy::FailFast => Err(ResolutionError::UnknownStages {
                names: resolution.skipped,
            }),
            UnknownStagePolicy::Skip => {
                for name in &resolution.skipped {
                    warn!(stage = %name, "Engine not found: {}", name);
                }
                Ok(resolution)
            }
        }
    }
}
