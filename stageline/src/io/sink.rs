//! Delta sink trait and implementations.

use crate::core::Delta;
use crate::errors::SinkError;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, Level};

/// Trait for consumers of per-stage deltas.
///
/// The executor awaits each delivery before starting the next stage.
/// Delivery is best-effort: a returned error is logged by the executor and
/// never changes the outcome of the run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeltaSink: Send + Sync {
    /// Delivers the delta produced by `stage`.
    async fn send(&self, stage: &str, delta: Delta) -> Result<(), SinkError>;
}

/// A sink that discards all deltas.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDeltaSink;

#[async_trait]
impl DeltaSink for NoOpDeltaSink {
    async fn send(&self, _stage: &str, _delta: Delta) -> Result<(), SinkError> {
        Ok(())
    }
}

/// A sink that logs deltas using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingDeltaSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingDeltaSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingDeltaSink {
    /// Creates a new logging sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

#[async_trait]
impl DeltaSink for LoggingDeltaSink {
    async fn send(&self, stage: &str, delta: Delta) -> Result<(), SinkError> {
        let changes = delta.into_value();
        if self.level == Level::DEBUG {
            debug!(stage = %stage, delta = %changes, "Sending delta");
        } else {
            info!(stage = %stage, delta = %changes, "Sending delta");
        }
        Ok(())
    }
}

/// A sink that keeps every delta it receives.
#[derive(Debug, Default)]
pub struct CollectingDeltaSink {
    deltas: RwLock<Vec<(String, Delta)>>,
}

impl CollectingDeltaSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected deltas with their stage names.
    #[must_use]
    pub fn deltas(&self) -> Vec<(String, Delta)> {
        self.deltas.read().clone()
    }

    /// Returns the stage names in delivery order.
    #[must_use]
    pub fn stages(&self) -> Vec<String> {
        self.deltas.read().iter().map(|(s, _)| s.clone()).collect()
    }

    /// Returns the number of collected deltas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.read().is_empty()
    }
}

#[async_trait]
impl DeltaSink for CollectingDeltaSink {
    async fn send(&self, stage: &str, delta: Delta) -> Result<(), SinkError> {
        self.deltas.write().push((stage.to_string(), delta));
        Ok(())
    }
}
