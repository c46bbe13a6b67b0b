//! Pipeline resolution and execution.
//!
//! This module provides:
//! - The stage registry and unknown-name policies
//! - The run state machine and run reports
//! - The sequential executor

mod executor;
mod registry;
mod run;

#[cfg(test)]
mod integration_tests;

pub use executor::PipelineExecutor;
pub use registry::{Resolution, StageRegistry, StageRegistryBuilder, UnknownStagePolicy};
pub use run::{Run, RunOutcome, RunPhase, RunReport};
