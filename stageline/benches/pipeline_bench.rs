//! Benchmarks for delta extraction and pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stageline::core::{extract_delta, State};
use stageline::pipeline::PipelineExecutor;
use stageline::stages::builtin_registry;

fn wide_state(fields: usize) -> State {
    (0..fields)
        .map(|i| (format!("field_{i}"), serde_json::json!({ "value": i })))
        .collect()
}

fn delta_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_delta");
    for fields in [10, 100, 1000] {
        let prior = wide_state(fields);
        let mut next = prior.clone();
        for i in (0..fields).step_by(10) {
            next.insert(format!("field_{i}"), "changed");
        }
        next.insert("added", true);

        group.bench_with_input(BenchmarkId::from_parameter(fields), &fields, |b, _| {
            b.iter(|| extract_delta(black_box(&prior), black_box(&next)));
        });
    }
    group.finish();
}

fn executor_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let resolution = builtin_registry()
        .resolve(&["EngineA", "EngineB", "EngineC", "engine1", "engine2"])
        .unwrap();
    let executor = PipelineExecutor::new();

    c.bench_function("run_builtin_engines", |b| {
        b.iter(|| runtime.block_on(executor.run(wide_state(50), &resolution.stages)));
    });
}

criterion_group!(benches, delta_benchmark, executor_benchmark);
criterion_main!(benches);
