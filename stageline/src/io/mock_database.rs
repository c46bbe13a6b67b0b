//! In-process stand-in for the database a pipeline reads from and writes to.

use super::{DeltaSink, StateSource};
use crate::core::{Delta, State};
use crate::errors::{SinkError, SourceError};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

/// A mock database acting as both initial state source and delta sink.
///
/// Delivered deltas are also applied to a stored copy of the state, so the
/// stored state always matches the cumulative effect of delivered deltas.
#[derive(Debug)]
pub struct MockDatabase {
    initial: State,
    stored: Mutex<State>,
    received: Mutex<Vec<(String, Delta)>>,
    available: bool,
}

impl Default for MockDatabase {
    fn default() -> Self {
        Self::new(State::new().with("data", "initial data"))
    }
}

impl MockDatabase {
    /// Creates a mock database seeded with `initial`.
    #[must_use]
    pub fn new(initial: State) -> Self {
        Self {
            stored: Mutex::new(initial.clone()),
            initial,
            received: Mutex::new(Vec::new()),
            available: true,
        }
    }

    /// Creates a database whose reads and writes all fail.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    /// Returns the stored state after applying received deltas.
    #[must_use]
    pub fn stored(&self) -> State {
        self.stored.lock().clone()
    }

    /// Returns received deltas with their stage names.
    #[must_use]
    pub fn received(&self) -> Vec<(String, Delta)> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl StateSource for MockDatabase {
    async fn fetch(&self) -> Result<State, SourceError> {
        info!("Fetching initial input from the database");
        if !self.available {
            return Err(SourceError::new("database unavailable"));
        }
        Ok(self.initial.clone())
    }
}

#[async_trait]
impl DeltaSink for MockDatabase {
    async fn send(&self, stage: &str, delta: Delta) -> Result<(), SinkError> {
        if !self.available {
            return Err(SinkError::new(stage, "database unavailable"));
        }
        info!(stage = %stage, changed = delta.len(), "Sending delta to the database");
        self.stored.lock().apply(&delta);
        self.received.lock().push((stage.to_string(), delta));
        Ok(())
    }
}
