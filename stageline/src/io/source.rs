//! Initial state sources.

use crate::core::State;
use crate::errors::SourceError;
use async_trait::async_trait;

/// Supplies the starting state of a run.
///
/// Called exactly once per run; a failure means no stage executes.
#[async_trait]
pub trait StateSource: Send + Sync {
    /// Fetches the initial state.
    async fn fetch(&self) -> Result<State, SourceError>;
}

/// A source that always returns the same state.
#[derive(Debug, Clone, Default)]
pub struct StaticStateSource {
    state: State,
}

impl StaticStateSource {
    /// Creates a source returning `state`.
    #[must_use]
    pub fn new(state: State) -> Self {
        Self { state }
    }
}

#[async_trait]
impl StateSource for StaticStateSource {
    async fn fetch(&self) -> Result<State, SourceError> {
        Ok(self.state.clone())
    }
}
