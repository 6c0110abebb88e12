use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vouch_ensemble::{EnsembleEngine, ModelResult, ModelTable, QualityContext, ScoreNormalizer};

fn evaluated_results(table: &ModelTable, ctx: &QualityContext) -> Vec<ModelResult> {
    table
        .names()
        .enumerate()
        .map(|(i, name)| {
            let raw = 0.9 + i as f64 * 0.01;
            ModelResult::evaluate(table, name, raw, Some(ctx)).unwrap()
        })
        .collect()
}

fn bench_decide(c: &mut Criterion) {
    let table = ModelTable::default();
    let engine = EnsembleEngine::new(table.ensemble.clone());
    let ctx = QualityContext::new(0.7, 0.0);
    let results = evaluated_results(&table, &ctx);

    c.bench_function("ensemble_decide_8_models", |b| {
        b.iter(|| {
            let _ = black_box(engine.decide(black_box(results.clone()), Some(&ctx)));
        });
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let table = ModelTable::default();
    let ctx = QualityContext::new(0.85, 0.0);

    c.bench_function("ensemble_evaluate_8_models", |b| {
        b.iter(|| {
            let _ = black_box(evaluated_results(black_box(&table), &ctx));
        });
    });
}

fn bench_normalize(c: &mut Criterion) {
    let n = ScoreNormalizer::default();

    c.bench_function("ensemble_normalize", |b| {
        b.iter(|| {
            let _ = black_box(n.normalize(black_box(0.87)));
        });
    });
}

criterion_group!(benches, bench_decide, bench_evaluate, bench_normalize);
criterion_main!(benches);
