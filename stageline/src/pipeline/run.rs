//! Run state machine and run reports.

use crate::core::{State, StageStatus};
use crate::errors::{StageError, EXIT_ABORTED, EXIT_CANCELLED};
use crate::stages::StageRecord;
use serde_json::json;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Not started yet.
    Pending,
    /// Executing the stage at this index.
    Running(usize),
    /// Every stage completed.
    Completed,
    /// The stage at `index` failed.
    Aborted {
        /// Index of the failed stage.
        index: usize,
    },
    /// Cancelled before the stage at `index` started.
    Cancelled {
        /// Index of the first stage that did not run.
        index: usize,
    },
}

impl RunPhase {
    /// Returns true for phases a run never leaves.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Aborted { .. } | Self::Cancelled { .. }
        )
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running(i) => write!(f, "running({i})"),
            Self::Completed => write!(f, "completed"),
            Self::Aborted { index } => write!(f, "aborted({index})"),
            Self::Cancelled { index } => write!(f, "cancelled({index})"),
        }
    }
}

/// One execution of an ordered stage list against an initial state.
///
/// The accumulated state always reflects every completed stage, in order.
/// Transitions out of a terminal phase are ignored.
#[derive(Debug)]
pub struct Run {
    id: Uuid,
    stage_names: Vec<String>,
    state: State,
    phase: RunPhase,
    records: Vec<StageRecord>,
}

impl Run {
    /// Creates a pending run.
    #[must_use]
    pub fn new(initial: State, stage_names: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage_names,
            state: initial,
            phase: RunPhase::Pending,
            records: Vec::new(),
        }
    }

    /// Returns the run id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Returns the accumulated state.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Returns the stage names of this run.
    #[must_use]
    pub fn stage_names(&self) -> &[String] {
        &self.stage_names
    }

    /// Returns the records of stages executed so far.
    #[must_use]
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Moves from `Pending` to the first stage, or straight to `Completed`
    /// when there are no stages.
    pub fn start(&mut self) {
        if self.phase == RunPhase::Pending {
            self.phase = self.position(0);
        }
    }

    /// Records a completed stage and moves to the next one.
    pub fn advance(&mut self, next: State, record: StageRecord) {
        if let RunPhase::Running(index) = self.phase {
            self.state = next;
            self.records.push(record);
            self.phase = self.position(index + 1);
        }
    }

    /// Records a failed stage and ends the run. The state is left as it was
    /// before the failed stage.
    pub fn abort(&mut self, record: StageRecord) {
        if let RunPhase::Running(index) = self.phase {
            self.records.push(record);
            self.phase = RunPhase::Aborted { index };
        }
    }

    /// Ends the run before the current stage starts.
    pub fn cancel(&mut self) {
        if let RunPhase::Running(index) = self.phase {
            self.phase = RunPhase::Cancelled { index };
        }
    }

    fn position(&self, index: usize) -> RunPhase {
        if index < self.stage_names.len() {
            RunPhase::Running(index)
        } else {
            RunPhase::Completed
        }
    }

    /// Converts a finished run into its report.
    #[must_use]
    pub fn into_report(
        self,
        outcome: RunOutcome,
        deltas_delivered: usize,
        sink_failures: usize,
        elapsed: Duration,
    ) -> RunReport {
        RunReport {
            run_id: self.id,
            outcome,
            final_state: self.state,
            records: self.records,
            deltas_delivered,
            sink_failures,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every stage completed.
    Completed,
    /// A stage failed and the run stopped there.
    Aborted {
        /// Index of the failed stage.
        index: usize,
        /// Name of the failed stage.
        stage: String,
        /// The error the stage returned.
        error: StageError,
    },
    /// The run was cancelled between stages.
    Cancelled {
        /// Index of the first stage that did not run.
        index: usize,
        /// The cancellation reason.
        reason: Option<String>,
    },
}

impl RunOutcome {
    /// Returns true if every stage completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns the name of the failed stage, if the run aborted.
    #[must_use]
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            Self::Aborted { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Returns the process exit code for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed => 0,
            Self::Aborted { .. } => EXIT_ABORTED,
            Self::Cancelled { .. } => EXIT_CANCELLED,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Aborted { stage, error, .. } => {
                write!(f, "aborted at stage '{stage}': {error}")
            }
            Self::Cancelled { index, reason } => match reason {
                Some(reason) => write!(f, "cancelled before stage {index}: {reason}"),
                None => write!(f, "cancelled before stage {index}"),
            },
        }
    }
}

/// The structured result of a run.
#[derive(Debug)]
pub struct RunReport {
    /// Unique run id.
    pub run_id: Uuid,
    /// How the run ended.
    pub outcome: RunOutcome,
    /// State after the last completed stage.
    pub final_state: State,
    /// One record per executed stage, in order.
    pub records: Vec<StageRecord>,
    /// Deltas the sink accepted.
    pub deltas_delivered: usize,
    /// Deltas the sink rejected.
    pub sink_failures: usize,
    /// Wall-clock duration of the run.
    pub duration_ms: f64,
}

impl RunReport {
    /// Returns `(stage name, status)` for every executed stage.
    #[must_use]
    pub fn stage_outcomes(&self) -> Vec<(&str, StageStatus)> {
        self.records
            .iter()
            .map(|r| (r.name.as_str(), r.status))
            .collect()
    }

    /// Returns the process exit code for this run.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }

    /// Builds a JSON summary of the run.
    #[must_use]
    pub fn summary(&self) -> serde_json::Value {
        json!({
            "run_id": self.run_id.to_string(),
            "outcome": self.outcome.to_string(),
            "failed_stage": self.outcome.failed_stage(),
            "stages": self.records,
            "final_state": self.final_state,
            "deltas_delivered": self.deltas_delivered,
            "sink_failures": self.sink_failures,
            "duration_ms": self.duration_ms,
        })
    }
}
