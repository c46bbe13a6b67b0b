//! Stage status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of a single stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage returned a new state.
    Completed,
    /// Stage returned an error or panicked.
    Failed,
}

impl StageStatus {
    /// Returns true for [`StageStatus::Completed`].
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
