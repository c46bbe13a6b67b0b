use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use stageline::cancellation::CancellationToken;
use stageline::config::{load_yaml, merge_configs, ConfigMap};
use stageline::core::State;
use stageline::errors::{ConfigError, StagelineError};
use stageline::flow::{
    FlowConfig, FlowController, ENGINES_ORDER_KEY, RUN_DIRECTORY_KEY, UNKNOWN_STAGES_KEY,
};
use stageline::io::MockDatabase;
use stageline::observability::{LoggingProgress, ProgressReporter};
use stageline::pipeline::PipelineExecutor;
use stageline::stages::builtin_registry;

use crate::progress::BarProgress;
use crate::RunArgs;

/// Execute the `run` command: resolve the requested stages and run them.
pub async fn execute(args: &RunArgs) -> Result<i32> {
    let (config, initial) = match prepare(args) {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::error!(error = %e, "Invalid run configuration");
            eprintln!("Error: {e}");
            return Ok(StagelineError::from(e).exit_code());
        }
    };

    let database = Arc::new(initial.map_or_else(MockDatabase::default, MockDatabase::new));
    let progress: Arc<dyn ProgressReporter> = if args.no_progress {
        Arc::new(LoggingProgress::new())
    } else {
        Arc::new(BarProgress::new())
    };

    let token = Arc::new(CancellationToken::new());
    let interrupt = Arc::clone(&token);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; stopping after the current stage");
            interrupt.cancel("interrupted");
        }
    });

    let executor = PipelineExecutor::new()
        .with_sink(database.clone())
        .with_progress(progress)
        .with_cancellation(token);
    let flow = FlowController::new(config, &builtin_registry());

    let report = match flow.run_with_source(&executor, database.as_ref()).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Run did not start");
            eprintln!("Error: {e}");
            return Ok(e.exit_code());
        }
    };

    let summary = serde_json::to_string_pretty(&report.summary())
        .context("Failed to render run summary")?;
    println!("{summary}");

    Ok(report.exit_code())
}

/// Merges config files, applies command-line overrides and loads the
/// initial state.
fn prepare(args: &RunArgs) -> Result<(FlowConfig, Option<State>), ConfigError> {
    let mut merged = if args.configs.is_empty() {
        ConfigMap::new()
    } else {
        merge_configs(&args.configs)?
    };

    if let Some(dir) = &args.run_directory {
        merged.insert(
            RUN_DIRECTORY_KEY.to_string(),
            Value::String(dir.to_string_lossy().into_owned()),
        );
    }
    if !args.engines.is_empty() {
        merged.insert(
            ENGINES_ORDER_KEY.to_string(),
            Value::from(args.engines.clone()),
        );
    }
    if args.fail_fast {
        merged.insert(UNKNOWN_STAGES_KEY.to_string(), Value::from("fail_fast"));
    }

    let config = FlowConfig::from_config(&merged)?;
    // JSON is valid YAML, so one loader covers both.
    let initial = args
        .initial
        .as_ref()
        .map(|path| load_yaml(path).map(State::from))
        .transpose()?;

    Ok((config, initial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stageline::pipeline::UnknownStagePolicy;
    use std::path::PathBuf;

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("flow.yaml");
        std::fs::write(
            &config_path,
            "run_directory: /from/config\nengines_order: [EngineA, EngineB]\n",
        )
        .unwrap();

        let args = RunArgs {
            run_directory: Some(PathBuf::from("/from/flag")),
            configs: vec![config_path],
            ..RunArgs::default()
        };
        let (config, initial) = prepare(&args).unwrap();

        assert_eq!(config.run_directory, PathBuf::from("/from/flag"));
        assert_eq!(config.engines_order, vec!["EngineA", "EngineB"]);
        assert_eq!(config.unknown_stages, UnknownStagePolicy::Skip);
        assert!(initial.is_none());
    }

    #[test]
    fn test_missing_engines_is_config_error() {
        let args = RunArgs {
            run_directory: Some(PathBuf::from("/tmp/run")),
            ..RunArgs::default()
        };
        let err = prepare(&args).unwrap_err();
        assert_eq!(err.to_string(), "Missing required configuration: engines_order");
    }

    #[test]
    fn test_initial_state_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let initial_path = dir.path().join("initial.json");
        std::fs::write(&initial_path, r#"{"data": "from file", "count": 3}"#).unwrap();

        let args = RunArgs {
            run_directory: Some(dir.path().join("run")),
            engines: vec!["EngineA".to_string()],
            fail_fast: true,
            initial: Some(initial_path),
            ..RunArgs::default()
        };
        let (config, initial) = prepare(&args).unwrap();

        assert_eq!(config.unknown_stages, UnknownStagePolicy::FailFast);
        assert_eq!(
            initial,
            Some(State::new().with("data", "from file").with("count", 3))
        );
    }

    #[tokio::test]
    async fn test_run_exit_codes() {
        let dir = tempfile::tempdir().unwrap();

        let completed = RunArgs {
            run_directory: Some(dir.path().join("ok")),
            engines: vec!["EngineA".to_string(), "EngineB".to_string()],
            no_progress: true,
            ..RunArgs::default()
        };
        assert_eq!(execute(&completed).await.unwrap(), 0);
        assert!(dir.path().join("ok").is_dir());

        let nothing_resolved = RunArgs {
            run_directory: Some(dir.path().join("none")),
            engines: vec!["EngineX".to_string()],
            no_progress: true,
            ..RunArgs::default()
        };
        assert_eq!(
            execute(&nothing_resolved).await.unwrap(),
            stageline::errors::EXIT_MISCONFIGURED
        );
    }
}
