//! Benchmarks for tag resolution and sync execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use piperoni::prelude::*;
use piperoni::testing::fixture_pipeline;

fn staged_pipeline(steps: usize) -> Pipeline {
    let mut pipe = fixture_pipeline();
    for _ in 0..steps {
        let _ = pipe
            .invoke("startMaybe", &[Arg::predicate(|_| true)])
            .and_then(|p| p.invoke("startTimes", &[Arg::from(2)]))
            .and_then(|p| p.invoke("increment", &[Arg::from(1)]))
            .and_then(|p| p.invoke("stopTimes", &[]))
            .and_then(|p| p.invoke("stopMaybe", &[]));
    }
    pipe
}

fn pipeline_benchmark(c: &mut Criterion) {
    let pipe = staged_pipeline(100);

    c.bench_function("resolve_nested_tags", |b| {
        b.iter(|| black_box(pipe.prepare(Value::from(0))))
    });

    c.bench_function("sync_execution", |b| {
        b.iter(|| {
            let mut run = pipe.prepare(black_box(Value::from(0))).ok()?;
            run.advance().ok()?;
            run.into_outcome().ok()
        })
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
