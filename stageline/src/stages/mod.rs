//! Stage trait and implementations.
//!
//! Stages are the units of work in a stageline pipeline. Each takes the
//! current state by value and returns the next one.

mod builtin;
mod result;

pub use builtin::{builtin_registry, MarkerStage, BUILTIN_STAGES};
pub use result::StageRecord;

use crate::core::State;
use crate::errors::StageError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt::Debug;

/// Trait for pipeline stages.
///
/// The name is stable for the lifetime of the stage and is used for
/// registry lookup, logging and error attribution.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Processes the state.
    ///
    /// # Arguments
    ///
    /// * `state` - An owned snapshot of the cumulative state so far
    ///
    /// # Returns
    ///
    /// The new cumulative state, or the error that stops the run.
    async fn process(&self, state: State) -> Result<State, StageError>;
}

/// A simple function-based stage.
pub struct FnStage<F>
where
    F: Fn(State) -> Result<State, StageError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(State) -> Result<State, StageError> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(State) -> Result<State, StageError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(State) -> Result<State, StageError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, state: State) -> Result<State, StageError> {
        (self.func)(state)
    }
}

/// An async function-based stage.
pub struct AsyncFnStage<F>
where
    F: Fn(State) -> BoxFuture<'static, Result<State, StageError>> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> AsyncFnStage<F>
where
    F: Fn(State) -> BoxFuture<'static, Result<State, StageError>> + Send + Sync,
{
    /// Creates a new async function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for AsyncFnStage<F>
where
    F: Fn(State) -> BoxFuture<'static, Result<State, StageError>> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnStage")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F> Stage for AsyncFnStage<F>
where
    F: Fn(State) -> BoxFuture<'static, Result<State, StageError>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, state: State) -> Result<State, StageError> {
        (self.func)(state).await
    }
}

/// A stage that passes the state through unchanged.
#[derive(Debug, Clone)]
pub struct NoOpStage {
    name: String,
}

impl NoOpStage {
    /// Creates a new no-op stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for NoOpStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, state: State) -> Result<State, StageError> {
        Ok(state)
    }
}
