//! Testing utilities for stageline pipelines.
//!
//! This module provides:
//! - Mock stages (fixed output, failure, panic, delay, recording)
//! - Assertions over run reports

mod assertions;
mod mocks;

pub use assertions::{assert_final_state, assert_run_aborted_at, assert_run_completed};
pub use mocks::{FailingStage, PanickingStage, RecordingStage, SetFieldsStage, SlowStage};
