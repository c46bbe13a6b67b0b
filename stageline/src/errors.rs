//! Error types for stageline.
//!
//! Errors are grouped by where they arise: configuration, stage resolution,
//! stage execution, and the external state source / delta sink. Configuration
//! and resolution problems stop a run before it starts; stage errors end a
//! run and are recorded in its outcome; sink errors are only logged.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for a run that stopped on a failing stage.
pub const EXIT_ABORTED: i32 = 1;
/// Exit code for configuration problems detected before any stage runs.
pub const EXIT_MISCONFIGURED: i32 = 2;
/// Exit code for a run cancelled between stages.
pub const EXIT_CANCELLED: i32 = 130;

/// The main error type for stageline operations.
#[derive(Debug, Error)]
pub enum StagelineError {
    /// Configuration could not be loaded or failed validation.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Requested stage names could not be resolved.
    #[error("{0}")]
    Resolution(#[from] ResolutionError),

    /// The initial state could not be fetched.
    #[error("{0}")]
    Source(#[from] SourceError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StagelineError {
    /// Returns the process exit code for this error.
    ///
    /// Everything here happens before or outside stage execution, so it is
    /// reported as a configuration failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        EXIT_MISCONFIGURED
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A YAML file could not be read or parsed.
    #[error("Failed to load YAML file: {}, Error: {reason}", path.display())]
    Load {
        /// The file path.
        path: PathBuf,
        /// The underlying failure.
        reason: String,
    },

    /// A YAML document was not a mapping at the top level.
    #[error("Configuration file {} must contain a mapping at the top level", path.display())]
    NotAMapping {
        /// The file path.
        path: PathBuf,
    },

    /// A required field is absent.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The field name.
        field: String,
    },

    /// A field has the wrong type.
    #[error("Field '{field}' should be of type {expected}")]
    TypeMismatch {
        /// The field name.
        field: String,
        /// The expected type name.
        expected: String,
    },

    /// A numeric field is outside its allowed range.
    #[error("Field '{field}' must be between {min} and {max}")]
    OutOfRange {
        /// The field name.
        field: String,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// A path field points at nothing.
    #[error("Specified path for '{field}' does not exist: {}", path.display())]
    PathNotFound {
        /// The field name.
        field: String,
        /// The missing path.
        path: PathBuf,
    },

    /// A run parameter is missing.
    #[error("Missing required configuration: {key}")]
    MissingParameter {
        /// The parameter key.
        key: String,
    },

    /// The run directory could not be created.
    #[error("Failed to create run directory {}: {source}", path.display())]
    RunDirectory {
        /// The directory path.
        path: PathBuf,
        /// The IO failure.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Returns the name of the offending field, if the error concerns one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field }
            | Self::TypeMismatch { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::PathNotFound { field, .. } => Some(field),
            Self::MissingParameter { key } => Some(key),
            Self::Load { .. } | Self::NotAMapping { .. } | Self::RunDirectory { .. } => None,
        }
    }
}

/// Errors raised while resolving stage names against a registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    /// One or more requested stages are not registered.
    #[error("Unknown stage(s): {}", names.join(", "))]
    UnknownStages {
        /// The unknown names, in request order.
        names: Vec<String>,
    },

    /// Nothing was left to run after resolution.
    #[error("No stages resolved from the requested list")]
    NoStages,
}

/// An error returned by a stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// The stage reported a failure.
    #[error("{0}")]
    Failed(String),

    /// The stage panicked while processing.
    #[error("stage panicked: {0}")]
    Panicked(String),

    /// Any other error raised inside the stage.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Creates a failure with a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Returns true if the stage panicked.
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

/// Error raised when a delta cannot be delivered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to deliver delta for stage '{stage}': {message}")]
pub struct SinkError {
    /// The stage whose delta was being delivered.
    pub stage: String,
    /// The failure message.
    pub message: String,
}

impl SinkError {
    /// Creates a new sink error.
    #[must_use]
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Error raised when the initial state cannot be fetched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to fetch initial state: {message}")]
pub struct SourceError {
    /// The failure message.
    pub message: String,
}

impl SourceError {
    /// Creates a new source error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::MissingField {
            field: "port".to_string(),
        };
        assert_eq!(err.to_string(), "Missing required field: port");
        assert_eq!(err.field(), Some("port"));

        let err = ConfigError::OutOfRange {
            field: "workers".to_string(),
            min: 1.0,
            max: 8.0,
        };
        assert_eq!(err.to_string(), "Field 'workers' must be between 1 and 8");
    }

    #[test]
    fn test_load_error_has_no_field() {
        let err = ConfigError::Load {
            path: PathBuf::from("missing.yaml"),
            reason: "not found".to_string(),
        };
        assert!(err.field().is_none());
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[test]
    fn test_unknown_stages_lists_names() {
        let err = ResolutionError::UnknownStages {
            names: vec!["EngineX".to_string(), "EngineY".to_string()],
        };
        assert_eq!(err.to_string(), "Unknown stage(s): EngineX, EngineY");
    }

    #[test]
    fn test_stage_error_variants() {
        let err = StageError::failed("boom");
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_panic());

        let err = StageError::from(anyhow::anyhow!("wrapped cause"));
        assert_eq!(err.to_string(), "wrapped cause");

        assert!(StageError::Panicked("oops".to_string()).is_panic());
    }

    #[test]
    fn test_stageline_error_from_parts() {
        let err: StagelineError = SourceError::new("db down").into();
        assert!(matches!(err, StagelineError::Source(_)));
        assert_eq!(err.exit_code(), EXIT_MISCONFIGURED);

        let err: StagelineError = ResolutionError::NoStages.into();
        assert!(err.to_string().contains("No stages"));
    }

    #[test]
    fn test_sink_error_message() {
        let err = SinkError::new("EngineA", "connection reset");
        assert!(err.to_string().contains("EngineA"));
        assert!(err.to_string().contains("connection reset"));
    }
}
