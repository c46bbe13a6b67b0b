//! Built-in demonstration engines.

use super::Stage;
use crate::core::State;
use crate::errors::StageError;
use crate::pipeline::StageRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Names and output fields of the built-in engines, in registration order.
pub const BUILTIN_STAGES: &[(&str, &str)] = &[
    ("EngineA", "engine_a"),
    ("EngineB", "engine_b"),
    ("EngineC", "engine_c"),
    ("engine1", "engine1"),
    ("engine2", "engine2"),
];

/// A stage that marks a field as `"processed"`.
#[derive(Debug, Clone)]
pub struct MarkerStage {
    name: String,
    field: String,
}

impl MarkerStage {
    /// Creates a stage named `name` that sets `field`.
    #[must_use]
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
        }
    }

    /// Returns the field this stage sets.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }
}

#[async_trait]
impl Stage for MarkerStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, mut state: State) -> Result<State, StageError> {
        info!(stage = %self.name, "Running {}", self.name);
        tokio::task::yield_now().await;
        state.insert(self.field.clone(), "processed");
        Ok(state)
    }
}

/// Builds a registry holding every built-in engine.
#[must_use]
pub fn builtin_registry() -> StageRegistry {
    BUILTIN_STAGES
        .iter()
        .fold(StageRegistry::builder(), |builder, (name, field)| {
            builder.register(Arc::new(MarkerStage::new(*name, *field)))
        })
        .build()
}
