use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feature_engine::{FeatureExtractor, Framer, FramingConfig, SpectralTransform};
use signal_ingest::{Label, Signal, SourceUnit};

fn synthetic_signal(len: usize) -> Signal {
    let values: Vec<f64> = (0..len)
        .map(|i| 2048.0 + 400.0 * (i as f64 * 0.37).sin() + 90.0 * (i as f64 * 1.9).cos())
        .collect();
    Signal::from_values(&values, 28).expect("valid synthetic signal")
}

fn bench_frame_features(c: &mut Criterion) {
    let signal = synthetic_signal(5_000);
    let unit = SourceUnit::new("bench");
    let framer = Framer::new(FramingConfig {
        frame_size: 30,
        overlap_percent: 70.0,
    })
    .expect("valid framing");
    let extractor = FeatureExtractor::default();

    c.bench_function("frame_and_extract_5000_samples", |b| {
        let mut transform = SpectralTransform::new();
        b.iter(|| {
            let frames = framer.frames(black_box(&signal), &unit);
            extractor
                .extract_frames(&mut transform, &frames, Label::EVENT_A, None)
                .expect("extraction succeeds")
        })
    });
}

criterion_group!(benches, bench_frame_features);
criterion_main!(benches);
