//! Test assertions for run reports.

use crate::core::State;
use crate::pipeline::{RunOutcome, RunReport};

/// Asserts that every stage of the run completed.
pub fn assert_run_completed(report: &RunReport) {
    assert!(
        report.outcome.is_completed(),
        "Expected completed run, got: {}",
        report.outcome
    );
}

/// Asserts that the run aborted at the named stage.
pub fn assert_run_aborted_at(report: &RunReport, stage: &str) {
    match &report.outcome {
        RunOutcome::Aborted { stage: failed, .. } => assert_eq!(
            failed, stage,
            "Expected abort at stage '{stage}', got abort at '{failed}'"
        ),
        other => panic!("Expected abort at stage '{stage}', got: {other}"),
    }
}

/// Asserts that the final state of the run equals `expected`.
pub fn assert_final_state(report: &RunReport, expected: &State) {
    assert_eq!(
        &report.final_state, expected,
        "Final state mismatch: got {:?}, expected {:?}",
        report.final_state, expected
    );
}
