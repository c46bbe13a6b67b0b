//! Per-stage records kept in a run report.

use crate::core::StageStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to one stage during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub name: String,
    /// Position of the stage in the run, 0-indexed.
    pub index: usize,
    /// Stage status.
    pub status: StageStatus,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
    /// Fields the stage added or changed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_keys: Vec<String>,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageRecord {
    /// Creates a completed stage record.
    #[must_use]
    pub fn completed(
        name: impl Into<String>,
        index: usize,
        started_at: DateTime<Utc>,
        changed_keys: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            index,
            status: StageStatus::Completed,
            started_at,
            ended_at: Utc::now(),
            changed_keys,
            error: None,
        }
    }

    /// Creates a failed stage record.
    #[must_use]
    pub fn failed(
        name: impl Into<String>,
        index: usize,
        started_at: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            index,
            status: StageStatus::Failed,
            started_at,
            ended_at: Utc::now(),
            changed_keys: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_microseconds().unwrap_or(i64::MAX) as f64 / 1000.0
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
