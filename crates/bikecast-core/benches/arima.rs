//! Benchmark suite for model estimation and diagnostics.

use bikecast_core::algorithms::moving_average::centered_moving_average;
use bikecast_core::diagnostics::{adf_test, Correlogram};
use bikecast_core::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

fn daily_counts(n: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(7);
    let noise = Normal::new(0.0, 150.0).unwrap();
    (0..n)
        .map(|i| {
            let t = i as f64;
            4000.0 + 3.0 * t + 800.0 * (t * 2.0 * std::f64::consts::PI / 7.0).sin()
                + rng.sample(noise)
        })
        .collect()
}

fn bench_arima_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("ArimaFit");

    for n in [200, 731].iter() {
        let data = daily_counts(*n);

        group.bench_with_input(BenchmarkId::new("arima_1_1_1", n), &data, |b, data| {
            b.iter(|| {
                let mut model = Arima::new(1, 1, 1).unwrap();
                model.fit(black_box(data)).unwrap();
            });
        });

        group.bench_with_input(BenchmarkId::new("seasonal_weekly", n), &data, |b, data| {
            b.iter(|| {
                let spec = ArimaSpec::new(1, 0, 1).with_seasonal(0, 1, 1, 7);
                let mut model = Arima::with_spec(spec).unwrap();
                model.fit(black_box(data)).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_diagnostics(c: &mut Criterion) {
    let data = daily_counts(731);

    c.bench_function("adf_test", |b| b.iter(|| adf_test(black_box(&data), None)));
    c.bench_function("correlogram", |b| {
        b.iter(|| Correlogram::compute(black_box(&data), Some(30), 0.95))
    });
    c.bench_function("centered_ma_30", |b| {
        b.iter(|| centered_moving_average(black_box(&data), 30))
    });
}

criterion_group!(benches, bench_arima_fit, bench_diagnostics);
criterion_main!(benches);
