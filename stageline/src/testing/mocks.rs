//! Mock stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use crate::core::State;
use crate::errors::StageError;
use crate::stages::Stage;

/// A stage that writes a fixed set of fields onto its input.
#[derive(Debug)]
pub struct SetFieldsStage {
    name: String,
    fields: State,
}

impl SetFieldsStage {
    /// Creates a stage that writes `fields`.
    #[must_use]
    pub fn new(name: impl Into<String>, fields: State) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

#[async_trait]
impl Stage for SetFieldsStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, mut state: State) -> Result<State, StageError> {
        for (key, value) in self.fields.iter() {
            state.insert(key, value.clone());
        }
        Ok(state)
    }
}

/// A stage that always fails.
#[derive(Debug)]
pub struct FailingStage {
    name: String,
    error: String,
}

impl FailingStage {
    /// Creates a new failing stage.
    #[must_use]
    pub fn new(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: error.into(),
        }
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, _state: State) -> Result<State, StageError> {
        Err(StageError::failed(&self.error))
    }
}

/// A stage that panics.
#[derive(Debug)]
pub struct PanickingStage {
    name: String,
    message: String,
}

impl PanickingStage {
    /// Creates a stage that panics with `message`.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Stage for PanickingStage {
    fn name(&self) -> &str {
        &self.name
    }

    #[allow(clippy::panic)]
    async fn process(&self, _state: State) -> Result<State, StageError> {
        panic!("{}", self.message);
    }
}

/// A stage that sleeps before passing its input through.
#[derive(Debug)]
pub struct SlowStage {
    name: String,
    delay: Duration,
}

impl SlowStage {
    /// Creates a slow stage with delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(name: impl Into<String>, ms: u64) -> Self {
        Self {
            name: name.into(),
            delay: Duration::from_millis(ms),
        }
    }
}

#[async_trait]
impl Stage for SlowStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, state: State) -> Result<State, StageError> {
        tokio::time::sleep(self.delay).await;
        Ok(state)
    }
}

/// A stage that records every input it sees and passes it through.
#[derive(Debug)]
pub struct RecordingStage {
    name: String,
    inputs: Mutex<Vec<State>>,
}

impl RecordingStage {
    /// Creates a new recording stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Returns every input received, in call order.
    #[must_use]
    pub fn inputs(&self) -> Vec<State> {
        self.inputs.lock().clone()
    }

    /// Returns the number of times the stage ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inputs.lock().len()
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, state: State) -> Result<State, StageError> {
        self.inputs.lock().push(state.clone());
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_fields_stage() {
        let stage = SetFieldsStage::new("set", State::new().with("x", 1));
        let output = stage.process(State::new().with("x", 0).with("y", 2)).await.unwrap();
        assert_eq!(output, State::new().with("x", 1).with("y", 2));
    }

    #[tokio::test]
    async fn test_failing_stage() {
        let stage = FailingStage::new("fail", "test error");
        let err = stage.process(State::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "test error");
    }

    #[tokio::test]
    async fn test_slow_stage() {
        let stage = SlowStage::with_delay_ms("slow", 10);

        let start = std::time::Instant::now();
        let output = stage.process(State::new().with("k", true)).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(10));
        assert_eq!(output.get("k"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_recording_stage() {
        let stage = RecordingStage::new("record");

        stage.process(State::new()).await.unwrap();
        stage.process(State::new().with("n", 1)).await.unwrap();

        assert_eq!(stage.call_count(), 2);
        assert_eq!(stage.inputs()[1].get("n"), Some(&json!(1)));
    }
}
