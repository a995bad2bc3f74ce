//! Rule engine benchmarks
//!
//! Runs the built-in rule set over generated models of growing size,
//! sequentially and on the rayon pool.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Map, Value};
use threatlens::builder::build_model;
use threatlens::graph::ThreatModel;
use threatlens::raa::RaaScorer;
use threatlens::rules::RiskEngine;

/// A chain of web/database pairs split over two network zones.
fn generated_model(pairs: usize) -> ThreatModel {
    let mut assets = Map::new();
    let mut front = Vec::new();
    let mut back = Vec::new();
    for i in 0..pairs {
        let web = format!("web-{}", i);
        let db = format!("db-{}", i);
        assets.insert(
            web.clone(),
            json!({
                "id": web,
                "technology": "web-application",
                "internet": i % 3 == 0,
                "communication_links": {
                    "Query": { "target": db, "protocol": "jdbc" }
                }
            }),
        );
        assets.insert(
            db.clone(),
            json!({
                "id": db,
                "type": "datastore",
                "technology": "database",
                "confidentiality": if i % 2 == 0 { "confidential" } else { "internal" }
            }),
        );
        front.push(Value::String(web));
        back.push(Value::String(db));
    }
    let document = json!({
        "technical_assets": assets,
        "trust_boundaries": {
            "Front": { "technical_assets_inside": front },
            "Back": { "technical_assets_inside": back }
        }
    });
    let mut model = match build_model(document) {
        Ok(model) => model,
        Err(err) => panic!("benchmark model failed to build: {}", err),
    };
    RaaScorer::new().apply(&mut model);
    model
}

fn rule_engine_benchmark(c: &mut Criterion) {
    let sequential = RiskEngine::with_builtin_rules();
    let parallel = RiskEngine::with_builtin_rules().parallel(true);

    let mut group = c.benchmark_group("rule_engine");
    for pairs in [10usize, 50, 200] {
        let model = generated_model(pairs);
        group.bench_with_input(BenchmarkId::new("sequential", pairs), &model, |b, model| {
            b.iter(|| sequential.run(black_box(model)))
        });
        group.bench_with_input(BenchmarkId::new("parallel", pairs), &model, |b, model| {
            b.iter(|| parallel.run(black_box(model)))
        });
    }
    group.finish();
}

criterion_group!(benches, rule_engine_benchmark);
criterion_main!(benches);
