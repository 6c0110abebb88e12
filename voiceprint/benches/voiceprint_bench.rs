use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vouch_ensemble::ModelTable;
use vouch_voiceprint::{
    compute_fbank, AudioSample, EmbeddingModel, FbankConfig, FbankEmbeddingModel, FeatureKind,
    ModelRegistry, Verifier, VerifierOptions,
};

fn make_voice(f0: f64, n_samples: usize, sample_rate: u32) -> AudioSample {
    let samples = (0..n_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let phase = f0 * 2.0 * std::f64::consts::PI * t;
            (0.4 * phase.sin() + 0.2 * (2.0 * phase).sin()) as f32
        })
        .collect();
    AudioSample::new(samples, sample_rate)
}

fn bench_fbank_1s(c: &mut Criterion) {
    let cfg = FbankConfig::default();
    let audio = make_voice(150.0, 16000, 16000); // 1s

    c.bench_function("voiceprint_fbank_1s", |b| {
        b.iter(|| {
            let _ = black_box(compute_fbank(black_box(audio.samples()), 16000, &cfg));
        });
    });
}

fn bench_fbank_embedding_3s(c: &mut Criterion) {
    let model = FbankEmbeddingModel::default();
    let audio = make_voice(150.0, 48000, 16000); // 3s

    c.bench_function("voiceprint_fbank_embedding_3s", |b| {
        b.iter(|| {
            let _ = black_box(model.embed(black_box(&audio)));
        });
    });
}

fn bench_extractors(c: &mut Criterion) {
    let audio = make_voice(150.0, 48000, 16000); // 3s

    for kind in FeatureKind::ALL {
        c.bench_function(&format!("voiceprint_extract_{kind}_3s"), |b| {
            b.iter(|| {
                let _ = black_box(kind.extract(black_box(&audio)));
            });
        });
    }
}

fn bench_verify_3s(c: &mut Criterion) {
    let verifier = Verifier::new(
        ModelTable::default(),
        ModelRegistry::new(),
        VerifierOptions::default(),
    )
    .unwrap();
    let stored = make_voice(150.0, 48000, 16000);
    let probe = make_voice(155.0, 48000, 16000);

    c.bench_function("voiceprint_verify_3s", |b| {
        b.iter(|| {
            let _ = black_box(verifier.verify(black_box(&stored), black_box(&probe)));
        });
    });
}

criterion_group!(
    benches,
    bench_fbank_1s,
    bench_fbank_embedding_3s,
    bench_extractors,
    bench_verify_3s,
);
criterion_main!(benches);
