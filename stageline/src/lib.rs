//! # Stageline
//!
//! Sequential stage pipelines with per-stage deltas.
//!
//! An initial state is run through an ordered list of named stages. After
//! each stage the fields it added or changed are extracted as a delta and
//! forwarded to a sink, the full output becomes the next stage's input, and
//! the first failing stage ends the run. Stageline provides:
//!
//! - **Stage registry**: name to stage lookup with an explicit policy for
//!   unknown names
//! - **Delta extraction**: pure comparison of a stage's input and output
//! - **Sequential execution**: progress reporting, stop on first failure and
//!   cancellation at stage boundaries
//! - **Configuration**: YAML loading, merging and schema validation
//! - **Flow control**: run directory setup, resolution and execution
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stageline::prelude::*;
//!
//! let registry = builtin_registry();
//! let resolution = registry.resolve(&["EngineA", "EngineB"])?;
//!
//! let executor = PipelineExecutor::new().with_sink(Arc::new(LoggingDeltaSink::default()));
//! let report = executor.run(State::new().with("data", "initial data"), &resolution.stages).await;
//! assert!(report.outcome.is_completed());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod errors;
pub mod flow;
pub mod io;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{load_yaml, merge_configs, ConfigMap, ConfigValidator, FieldSpec, FieldType};
    pub use crate::core::{extract_delta, Delta, StageStatus, State};
    pub use crate::errors::{
        ConfigError, ResolutionError, SinkError, SourceError, StageError, StagelineError,
    };
    pub use crate::flow::{FlowConfig, FlowController};
    pub use crate::io::{
        CollectingDeltaSink, DeltaSink, LoggingDeltaSink, MockDatabase, NoOpDeltaSink,
        StateSource, StaticStateSource,
    };
    pub use crate::observability::{init_logging, LogFormat, ProgressReporter};
    pub use crate::pipeline::{
        PipelineExecutor, Resolution, RunOutcome, RunReport, StageRegistry, UnknownStagePolicy,
    };
    pub use crate::stages::{builtin_registry, FnStage, Stage, StageRecord};
}
