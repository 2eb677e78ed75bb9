//! Benchmarks for transform binding and record execution.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::explicit_iter_loop,
    missing_docs
)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tabform::{ExecutionOptions, MathOp, Record, Schema, Transform, TransformProcess, Value};

fn create_schema() -> Schema {
    Schema::builder()
        .add_long("id", Some(0), Some(1_000_000))
        .add_string("name")
        .add_long("score", Some(0), Some(100))
        .add_long("bonus", Some(0), Some(10))
        .build()
        .expect("Failed to create schema")
}

fn create_records(rows: usize) -> Vec<Record> {
    #[allow(clippy::cast_possible_wrap)]
    (0..rows as i64)
        .map(|i| {
            vec![
                Value::Long(i),
                Value::from(format!("item_{i}")),
                Value::Long(i % 101),
                Value::Long(i % 11),
            ]
        })
        .collect()
}

fn create_process() -> TransformProcess {
    TransformProcess::builder(create_schema())
        .remove_columns(["name"])
        .long_math_op("score", MathOp::Multiply, 2)
        .long_columns_math_op("total", MathOp::Add, ["score", "bonus"])
        .build()
        .expect("Failed to build process")
}

fn bench_bind(c: &mut Criterion) {
    let schema = Arc::new(create_schema());
    let transform = Transform::long_math_op("score", MathOp::Add, 5);

    c.bench_function("bind_and_derive", |b| {
        b.iter(|| {
            let bound = transform.bind(Arc::clone(&schema)).unwrap();
            black_box(bound.output_schema().unwrap())
        });
    });
}

fn bench_execute(c: &mut Criterion) {
    let process = create_process();
    let record = create_records(1).remove(0);

    c.bench_function("execute_single", |b| {
        b.iter(|| process.execute(black_box(&record)).unwrap());
    });
}

fn bench_execute_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute_batch");
    let process = create_process();

    for size in [100, 1_000, 10_000].iter() {
        let records = create_records(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("sequential", size), &records, |b, records| {
            b.iter(|| {
                process
                    .execute_batch(black_box(records), &ExecutionOptions::new())
                    .unwrap()
            });
        });
        #[cfg(feature = "parallel")]
        group.bench_with_input(BenchmarkId::new("parallel", size), &records, |b, records| {
            let options = ExecutionOptions::new().num_threads(4);
            b.iter(|| process.execute_batch(black_box(records), &options).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bind, bench_execute, bench_execute_batch);
criterion_main!(benches);
