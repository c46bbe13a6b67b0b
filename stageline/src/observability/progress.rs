//! Progress reporting for pipeline runs.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Receives one progress unit per successfully completed stage.
///
/// Failed stages and stages that never ran do not advance progress.
pub trait ProgressReporter: Send + Sync {
    /// Called once before the first stage with the number of stages.
    fn start(&self, total: usize);

    /// Called after `stage` completed and its delta was delivered.
    fn advance(&self, stage: &str);

    /// Called once when the run reaches a terminal phase.
    fn finish(&self);
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    fn start(&self, _total: usize) {}

    fn advance(&self, _stage: &str) {}

    fn finish(&self) {}
}

/// Logs progress as `completed/total` lines.
#[derive(Debug, Default)]
pub struct LoggingProgress {
    total: AtomicUsize,
    completed: AtomicUsize,
}

impl LoggingProgress {
    /// Creates a new logging reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for LoggingProgress {
    fn start(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        info!(total, "Running engines...");
    }

    fn advance(&self, stage: &str) {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.load(Ordering::SeqCst);
        info!(stage = %stage, completed, total, "Progress {}/{}", completed, total);
    }

    fn finish(&self) {
        info!(
            completed = self.completed.load(Ordering::SeqCst),
            total = self.total.load(Ordering::SeqCst),
            "Engines finished"
        );
    }
}

/// Records every progress call, for assertions.
#[derive(Debug, Default)]
pub struct CountingProgress {
    total: AtomicUsize,
    advanced: Mutex<Vec<String>>,
    finished: AtomicUsize,
}

impl CountingProgress {
    /// Creates a new counting reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total announced by `start`.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Returns the number of advances.
    #[must_use]
    pub fn advances(&self) -> usize {
        self.advanced.lock().len()
    }

    /// Returns the stages that advanced progress, in order.
    #[must_use]
    pub fn advanced_stages(&self) -> Vec<String> {
        self.advanced.lock().clone()
    }

    /// Returns how many times `finish` was called.
    #[must_use]
    pub fn finish_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl ProgressReporter for CountingProgress {
    fn start(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn advance(&self, stage: &str) {
        self.advanced.lock().push(stage.to_string());
    }

    fn finish(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_progress() {
        let progress = CountingProgress::new();
        progress.start(3);
        progress.advance("a");
        progress.advance("b");
        progress.finish();

        assert_eq!(progress.total(), 3);
        assert_eq!(progress.advances(), 2);
        assert_eq!(progress.advanced_stages(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(progress.finish_count(), 1);
    }

    #[test]
    fn test_logging_progress_counts() {
        let progress = LoggingProgress::new();
        progress.start(2);
        progress.advance("a");
        progress.finish();
        assert_eq!(progress.completed.load(Ordering::SeqCst), 1);
    }
}
