//! Rolling regression benchmarks.

#![allow(missing_docs)]

use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use hobart_regression::{RollingConfig, rolling_ols};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn inputs(rows: usize, factors: usize) -> (Vec<NaiveDate>, Vec<String>, Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(7);
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default();
    let dates = (0..rows)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    let names = (0..factors).map(|k| format!("f{}", k)).collect();
    let x = Array2::from_shape_fn((rows, factors), |_| rng.gen_range(-1.0..1.0));
    let y = Array1::from_shape_fn(rows, |_| rng.gen_range(-1.0..1.0));
    (dates, names, x, y)
}

fn bench_rolling(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_ols");
    let (dates, names, x, y) = inputs(2_500, 4);

    for parallel in [false, true] {
        let config = RollingConfig {
            window: 60,
            parallel,
            rcond: None,
        };
        let label = if parallel { "parallel" } else { "serial" };
        group.bench_with_input(BenchmarkId::new(label, 60), &config, |b, config| {
            b.iter(|| rolling_ols(&dates, &names, x.view(), y.view(), black_box(config)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rolling);
criterion_main!(benches);
