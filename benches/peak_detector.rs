use arrvee_peak_detect::audio::{PeakDetector, SpectrumAnalyzer};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn energy_stream(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f32 / 60.0;
            let kick = if (t * 2.0).fract() < 0.1 { 0.6 } else { 0.0 };
            0.2 + kick + 0.1 * (t * 7.0).sin()
        })
        .collect()
}

fn bench_update(c: &mut Criterion) {
    let energies = energy_stream(3600);

    c.bench_function("peak_detector_update_3600_frames", |b| {
        b.iter(|| {
            let mut detector = PeakDetector::default();
            let mut peaks = 0usize;
            for &energy in &energies {
                if detector.update(black_box(energy)) {
                    peaks += 1;
                }
            }
            peaks
        })
    });
}

fn bench_analyze_and_update(c: &mut Criterion) {
    let samples: Vec<f32> = (0..1024)
        .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / 44100.0).sin())
        .collect();
    let mut analyzer = SpectrumAnalyzer::new(44100.0, 1024);
    let mut detector = PeakDetector::new(20.0, 140.0, 0.25, 5);

    c.bench_function("analyze_and_update_1024", |b| {
        b.iter(|| {
            analyzer.analyze(black_box(&samples));
            detector.update_from(&analyzer)
        })
    });
}

criterion_group!(benches, bench_update, bench_analyze_and_update);
criterion_main!(benches);
