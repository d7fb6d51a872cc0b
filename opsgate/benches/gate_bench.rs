//! Benchmarks for validation and the approval cycle.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use opsgate::prelude::*;
use opsgate::testing::OpsFixture;

fn validation_benchmark(c: &mut Criterion) {
    let fixture = OpsFixture::new();
    let validator = fixture.validator();
    let valid = serde_json::json!({"service_name": "billing-api", "force": true});
    let valid = valid.as_object().cloned().unwrap_or_default();
    let missing = serde_json::json!({"service_name": "web"});
    let missing = missing.as_object().cloned().unwrap_or_default();

    c.bench_function("validate_ok", |b| {
        b.iter(|| black_box(validator.validate("restart_service", black_box(&valid), None)))
    });
    c.bench_function("validate_missing_argument", |b| {
        b.iter(|| black_box(validator.validate("scale_cluster", black_box(&missing), None)))
    });
}

fn gate_cycle_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let fixture = OpsFixture::new();
    let session = fixture.session("bench");
    let args = serde_json::json!({"service_name": "billing-api", "force": false});
    let args = args.as_object().cloned().unwrap_or_default();

    c.bench_function("submit_approve_acknowledge", |b| {
        b.iter(|| {
            runtime.block_on(async {
                session.submit("restart_service", &args, None).unwrap();
                let outcome = session.approve().await.unwrap();
                black_box(outcome);
                black_box(session.acknowledge().unwrap())
            })
        })
    });

    c.bench_function("submit_reject_acknowledge", |b| {
        b.iter(|| {
            session.submit("restart_service", &args, None).unwrap();
            session.reject().unwrap();
            black_box(session.acknowledge().unwrap())
        })
    });
}

criterion_group!(benches, validation_benchmark, gate_cycle_benchmark);
criterion_main!(benches);
