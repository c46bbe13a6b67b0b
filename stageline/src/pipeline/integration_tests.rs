//! End-to-end tests: registry resolution through execution to the sink.

use crate::cancellation::CancellationToken;
use crate::core::{Delta, State, StageStatus};
use crate::errors::{ResolutionError, EXIT_ABORTED, EXIT_CANCELLED};
use crate::io::{CollectingDeltaSink, MockDatabase};
use crate::observability::CountingProgress;
use crate::pipeline::{PipelineExecutor, RunOutcome, StageRegistry, UnknownStagePolicy};
use crate::stages::{builtin_registry, FnStage, Stage};
use crate::testing::{
    assert_final_state, assert_run_aborted_at, assert_run_completed, FailingStage,
    RecordingStage, SetFieldsStage, SlowStage,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn state(value: serde_json::Value) -> State {
    State::from_value(value).unwrap()
}

fn delta(value: serde_json::Value) -> Delta {
    state(value).into_iter().collect()
}

#[tokio::test]
async fn test_two_stages_each_deliver_their_delta() {
    let registry = StageRegistry::builder()
        .register(Arc::new(SetFieldsStage::new("A", state(json!({"x": 1})))))
        .register(Arc::new(SetFieldsStage::new("B", state(json!({"y": 2})))))
        .build();
    let sink = Arc::new(CollectingDeltaSink::new());
    let progress = Arc::new(CountingProgress::new());
    let executor = PipelineExecutor::new()
        .with_sink(sink.clone())
        .with_progress(progress.clone());

    let resolution = registry.resolve(&["A", "B"]).unwrap();
    let report = executor.run(State::new(), &resolution.stages).await;

    assert_run_completed(&report);
    assert_final_state(&report, &state(json!({"x": 1, "y": 2})));
    assert_eq!(
        sink.deltas(),
        vec![
            ("A".to_string(), delta(json!({"x": 1}))),
            ("B".to_string(), delta(json!({"y": 2}))),
        ]
    );
    assert_eq!(progress.total(), 2);
    assert_eq!(progress.advances(), 2);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn test_second_stage_failure_aborts_with_first_output() {
    let registry = StageRegistry::builder()
        .register(Arc::new(SetFieldsStage::new("A", state(json!({"x": 1})))))
        .register(Arc::new(FailingStage::new("B", "disk full")))
        .build();
    let sink = Arc::new(CollectingDeltaSink::new());
    let progress = Arc::new(CountingProgress::new());
    let executor = PipelineExecutor::new()
        .with_sink(sink.clone())
        .with_progress(progress.clone());

    let resolution = registry.resolve(&["A", "B"]).unwrap();
    let report = executor.run(State::new(), &resolution.stages).await;

    assert_run_aborted_at(&report, "B");
    assert_final_state(&report, &state(json!({"x": 1})));
    assert_eq!(sink.len(), 1);
    assert_eq!(progress.advances(), 1);
    assert_eq!(
        report.stage_outcomes(),
        vec![("A", StageStatus::Completed), ("B", StageStatus::Failed)]
    );
    assert_eq!(report.exit_code(), EXIT_ABORTED);
    assert_eq!(report.records[1].error.as_deref(), Some("disk full"));
}

#[tokio::test]
async fn test_builtin_engines_against_mock_database() {
    let db = Arc::new(MockDatabase::default());
    let executor = PipelineExecutor::new().with_sink(db.clone());
    let resolution = builtin_registry()
        .resolve(&["EngineA", "EngineB", "EngineC"])
        .unwrap();

    let report = executor
        .run_from_source(db.as_ref(), &resolution.stages)
        .await
        .unwrap();

    assert_run_completed(&report);
    assert_eq!(
        db.received()
            .iter()
            .map(|(stage, d)| (stage.as_str(), d.clone().into_value()))
            .collect::<Vec<_>>(),
        vec![
            ("EngineA", json!({"engine_a": "processed"})),
            ("EngineB", json!({"engine_b": "processed"})),
            ("EngineC", json!({"engine_c": "processed"})),
        ]
    );
    assert_eq!(db.stored(), report.final_state);
    assert_eq!(report.final_state.get("data"), Some(&json!("initial data")));
}

#[tokio::test]
async fn test_unknown_names_skipped_then_run() {
    let resolution = builtin_registry()
        .resolve(&["EngineX", "engine2", "engine1"])
        .unwrap();
    assert_eq!(resolution.skipped, vec!["EngineX".to_string()]);

    let report = PipelineExecutor::new()
        .run(State::new(), &resolution.stages)
        .await;

    assert_run_completed(&report);
    assert_eq!(
        report.final_state.keys().collect::<Vec<_>>(),
        vec!["engine2", "engine1"]
    );
}

#[test]
fn test_unknown_names_rejected_under_fail_fast() {
    let registry = builtin_registry().with_policy(UnknownStagePolicy::FailFast);
    let err = registry.resolve(&["EngineA", "EngineZ"]).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::UnknownStages {
            names: vec!["EngineZ".to_string()],
        }
    );
}

#[tokio::test]
async fn test_stages_run_one_at_a_time_in_order() {
    let recorder = Arc::new(RecordingStage::new("recorder"));
    let stages: Vec<Arc<dyn Stage>> = vec![
        Arc::new(SlowStage::with_delay_ms("slow", 20)),
        Arc::new(SetFieldsStage::new("mark", state(json!({"after_slow": true})))),
        recorder.clone(),
    ];
    let sink = Arc::new(CollectingDeltaSink::new());

    let report = PipelineExecutor::new()
        .with_sink(sink.clone())
        .run(State::new(), &stages)
        .await;

    assert_run_completed(&report);
    assert_eq!(sink.stages(), vec!["slow", "mark", "recorder"]);
    assert_eq!(recorder.inputs(), vec![state(json!({"after_slow": true}))]);
}

#[tokio::test]
async fn test_cancel_from_inside_a_stage_stops_at_next_boundary() {
    let token = Arc::new(CancellationToken::new());
    let trigger = Arc::clone(&token);
    let after = Arc::new(RecordingStage::new("after"));
    let stages: Vec<Arc<dyn Stage>> = vec![
        Arc::new(FnStage::new("trigger", move |state: State| {
            trigger.cancel("operator interrupt");
            Ok(state.with("triggered", true))
        })),
        after.clone(),
    ];

    let report = PipelineExecutor::new()
        .with_cancellation(token)
        .run(State::new(), &stages)
        .await;

    // The running stage finishes and its output is kept.
    assert_final_state(&report, &state(json!({"triggered": true})));
    assert_eq!(after.call_count(), 0);
    assert!(matches!(
        report.outcome,
        RunOutcome::Cancelled { index: 1, .. }
    ));
    assert_eq!(report.exit_code(), EXIT_CANCELLED);
}

#[tokio::test]
async fn test_shared_registry_across_concurrent_runs() {
    let registry = builtin_registry();
    let resolution = registry.resolve(&["engine1", "engine2"]).unwrap();
    let executor = PipelineExecutor::new();

    let (left, right) = tokio::join!(
        executor.run(state(json!({"run": "left"})), &resolution.stages),
        executor.run(state(json!({"run": "right"})), &resolution.stages),
    );

    assert_run_completed(&left);
    assert_run_completed(&right);
    assert_eq!(left.final_state.get("run"), Some(&json!("left")));
    assert_eq!(right.final_state.get("run"), Some(&json!("right")));
    assert_ne!(left.run_id, right.run_id);
}

#[tokio::test]
async fn test_aliased_stages_report_registered_names() {
    let registry = StageRegistry::builder()
        .register_as(
            "EngineA",
            Arc::new(SetFieldsStage::new("set_impl", state(json!({"x": 1})))),
        )
        .register_as("EngineB", Arc::new(FailingStage::new("internal_impl", "boom")))
        .build();
    let sink = Arc::new(CollectingDeltaSink::new());
    let progress = Arc::new(CountingProgress::new());
    let executor = PipelineExecutor::new()
        .with_sink(sink.clone())
        .with_progress(progress.clone());

    let resolution = registry.resolve(&["EngineA", "EngineB"]).unwrap();
    let report = executor.run(State::new(), &resolution.stages).await;

    assert_run_aborted_at(&report, "EngineB");
    assert_eq!(report.outcome.failed_stage(), Some("EngineB"));
    assert_eq!(sink.stages(), vec!["EngineA"]);
    assert_eq!(progress.advanced_stages(), vec!["EngineA"]);
    assert_eq!(
        report.stage_outcomes(),
        vec![("EngineA", StageStatus::Completed), ("EngineB", StageStatus::Failed)]
    );
}
