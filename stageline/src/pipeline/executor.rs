//! Sequential pipeline executor.
//!
//! Runs stages strictly one at a time, in list order. After each successful
//! stage the executor computes the delta against the stage's input, awaits its
//! delivery to the sink, advances progress by one unit, and only then starts
//! the next stage. The first failing stage ends the run.

use super::run::{Run, RunOutcome, RunPhase, RunReport};
use crate::cancellation::CancellationToken;
use crate::core::{Delta, State};
use crate::errors::{StageError, StagelineError};
use crate::io::{DeltaSink, NoOpDeltaSink, StateSource};
use crate::observability::{NoOpProgress, ProgressReporter};
use crate::stages::{Stage, StageRecord};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

/// Drives a list of stages over a state.
#[derive(Clone)]
pub struct PipelineExecutor {
    sink: Arc<dyn DeltaSink>,
    progress: Arc<dyn ProgressReporter>,
    cancellation: Option<Arc<CancellationToken>>,
}

impl Default for PipelineExecutor {
    fn default() -> Self {
        Self {
            sink: Arc::new(NoOpDeltaSink),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("cancellation", &self.cancellation)
            .finish_non_exhaustive()
    }
}

impl PipelineExecutor {
    /// Creates an executor that discards deltas and progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delta sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DeltaSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the progress reporter.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Sets a cancellation token, checked before each stage starts.
    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Fetches the initial state from `source` and runs the stages.
    ///
    /// # Errors
    ///
    /// Returns [`StagelineError::Source`] if the initial state cannot be
    /// fetched; no stage runs in that case.
    pub async fn run_from_source(
        &self,
        source: &dyn StateSource,
        stages: &[Arc<dyn Stage>],
    ) -> Result<RunReport, StagelineError> {
        let initial = source.fetch().await.map_err(|e| {
            error!(error = %e, "Could not fetch initial state");
            e
        })?;
        Ok(self.run(initial, stages).await)
    }

    /// Runs the stages over `initial`.
    ///
    /// Never fails: stage errors and panics end the run with
    /// [`RunOutcome::Aborted`], and sink errors are logged and counted.
    pub async fn run(&self, initial: State, stages: &[Arc<dyn Stage>]) -> RunReport {
        let names = stages.iter().map(|s| s.name().to_string()).collect();
        let run = Run::new(initial, names);
        let span = info_span!("pipeline_run", run_id = %run.id(), stages = stages.len());

        self.drive(run, stages).instrument(span).await
    }

    async fn drive(&self, mut run: Run, stages: &[Arc<dyn Stage>]) -> RunReport {
        let started = Instant::now();
        let mut deltas_delivered = 0;
        let mut sink_failures = 0;

        self.progress.start(stages.len());
        run.start();

        let outcome = loop {
            // Aborts and cancellations break out directly, so anything other
            // than Running here means every stage completed.
            let RunPhase::Running(index) = run.phase() else {
                break RunOutcome::Completed;
            };

            if let Some(token) = self.cancellation.as_deref().filter(|t| t.is_cancelled()) {
                let reason = token.reason();
                warn!(index, reason = ?reason, "Run cancelled before stage");
                run.cancel();
                break RunOutcome::Cancelled { index, reason };
            }

            let stage = &stages[index];
            let name = stage.name();
            info!(stage = %name, index, "Running engine: {}", name);
            let started_at = Utc::now();

            let result = AssertUnwindSafe(stage.process(run.state().clone()))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(StageError::Panicked(panic_message(&*panic))));

            match result {
                Ok(output) => {
                    let delta = Delta::extract(run.state(), &output);
                    let changed_keys: Vec<String> = delta.keys().map(str::to_string).collect();
                    info!(stage = %name, index, changed = changed_keys.len(), "Finished engine: {}", name);

                    match self.sink.send(name, delta).await {
                        Ok(()) => deltas_delivered += 1,
                        Err(e) => {
                            sink_failures += 1;
                            warn!(stage = %name, error = %e, "Delta delivery failed; continuing");
                        }
                    }

                    self.progress.advance(name);
                    run.advance(output, StageRecord::completed(name, index, started_at, changed_keys));
                }
                Err(e) => {
                    error!(stage = %name, index, error = %e, "Error running engine {}: {}", name, e);
                    run.abort(StageRecord::failed(name, index, started_at, e.to_string()));
                    break RunOutcome::Aborted {
                        index,
                        stage: name.to_string(),
                        error: e,
                    };
                }
            }
        };

        self.progress.finish();
        info!(outcome = %outcome, deltas_delivered, sink_failures, "Run finished");

        run.into_report(outcome, deltas_delivered, sink_failures, started.elapsed())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
