use criterion::{Criterion, black_box, criterion_group, criterion_main};

use thrustcal_core::fit::{expo_model, fit_expo};
use thrustcal_core::{BandCfg, CurvePoint, FitCfg, normalize::normalize_band};

// Synthetic normalized curve with deterministic white noise
fn synth_curve(n: usize, a: f64, noise_amp: f64, seed: u32) -> Vec<CurvePoint> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next_f64 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    };
    (0..n)
        .map(|i| {
            let pwm = i as f64 / (n - 1) as f64;
            let noise = (next_f64() * 2.0 - 1.0) * noise_amp;
            CurvePoint {
                pwm,
                thrust: expo_model(pwm, a) + noise,
            }
        })
        .collect()
}

fn bench_fit(c: &mut Criterion) {
    let cfg = FitCfg::default();
    for n in [50usize, 500, 5000] {
        let points = synth_curve(n, 0.7, 0.01, 42);
        c.bench_function(&format!("fit_expo_{n}"), |b| {
            b.iter(|| fit_expo(black_box(&points), black_box(&cfg)).unwrap())
        });
    }
}

fn bench_pipeline_stages(c: &mut Criterion) {
    let band = BandCfg::default();
    let points = synth_curve(2000, 0.7, 0.01, 7);
    c.bench_function("normalize_band_2000", |b| {
        b.iter(|| normalize_band(black_box(&points), black_box(&band)).unwrap())
    });
}

criterion_group!(benches, bench_fit, bench_pipeline_stages);
criterion_main!(benches);
