//! End-to-end properties of the align → standardize → regress → normalize chain.

use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use hobart_data::TimeSeries;
use hobart_regression::standardize::column_moments;
use hobart_regression::{
    CoefficientNormalizer, RegressionError, RollingConfig, RollingRegressor, SeriesAligner,
    Standardizer, rolling_ols,
};
use ndarray::{Array2, array};
use rstest::rstest;
use std::collections::BTreeSet;

fn day(i: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + chrono::Duration::days(i)
}

/// Deterministic, non-degenerate series over the given day offsets.
fn series(name: &str, offsets: impl IntoIterator<Item = i64>, seed: f64) -> TimeSeries {
    TimeSeries::from_points(
        name,
        offsets
            .into_iter()
            .map(|i| (day(i), (i as f64 * seed).sin() + 0.01 * i as f64)),
    )
    .unwrap()
}

#[test]
fn test_alignment_equals_exact_intersection() {
    let y = series("y", (0..60).filter(|i| i % 7 != 5), 0.31);
    let a = series("a", (10..80).filter(|i| i % 5 != 0), 0.17);
    let b = series("b", (0..70).filter(|i| i % 3 != 1), 0.53);

    let table = SeriesAligner::new().align(&y, &[a.clone(), b.clone()]).unwrap();

    let set = |s: &TimeSeries| s.dates().iter().copied().collect::<BTreeSet<_>>();
    let expected: BTreeSet<NaiveDate> = set(&y)
        .intersection(&set(&a))
        .copied()
        .collect::<BTreeSet<_>>()
        .intersection(&set(&b))
        .copied()
        .collect();

    assert_eq!(table.dates().iter().copied().collect::<BTreeSet<_>>(), expected);
    assert!(table.dates().windows(2).all(|w| w[0] < w[1]));
    assert_eq!(table.values().ncols(), 3);
    assert!(table.values().iter().all(|v| v.is_finite()));
}

#[test]
fn test_standardized_moments() {
    let y = series("y", 0..50, 0.21);
    let a = series("a", 0..50, 0.43);
    let table = SeriesAligner::new().align(&y, &[a]).unwrap();
    let standardized = Standardizer::new().standardize(&table).unwrap();

    for (mean, std_dev) in column_moments(standardized.values()) {
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(std_dev, 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_constant_series_is_degenerate_column() {
    let y = series("y", 0..20, 0.3);
    let flat = TimeSeries::from_points("flat", (0..20).map(|i| (day(i), 2.5))).unwrap();
    let table = SeriesAligner::new().align(&y, &[flat]).unwrap();

    assert_eq!(
        Standardizer::new().standardize(&table),
        Err(RegressionError::DegenerateColumn {
            column: "flat".to_string()
        })
    );
}

#[rstest]
#[case(30, 5)]
#[case(30, 30)]
#[case(47, 12)]
fn test_window_count_and_reference_dates(#[case] rows: i64, #[case] window: usize) {
    let y = series("y", 0..rows, 0.37);
    let a = series("a", 0..rows, 0.11);
    let b = series("b", 0..rows, 0.73);
    let table = SeriesAligner::new().align(&y, &[a, b]).unwrap();
    let standardized = Standardizer::new().standardize(&table).unwrap();

    let trajectory = RollingRegressor::with_window(window)
        .unwrap()
        .fit(&standardized)
        .unwrap();

    assert_eq!(trajectory.len(), rows as usize - window + 1);
    assert_eq!(trajectory.dates(), &table.dates()[window - 1..]);
    assert!(trajectory.dates().windows(2).all(|w| w[0] < w[1]));
}

#[rstest]
#[case(1, 2)]
#[case(2, 3)]
#[case(3, 3)]
fn test_window_smaller_than_parameters(#[case] window: usize, #[case] factors: usize) {
    let y = series("y", 0..20, 0.37);
    let factor_series: Vec<TimeSeries> = (0..factors)
        .map(|k| series(&format!("f{}", k), 0..20, 0.1 + 0.2 * k as f64))
        .collect();
    let table = SeriesAligner::new().align(&y, &factor_series).unwrap();
    let standardized = Standardizer::new().standardize(&table).unwrap();

    assert_eq!(
        RollingRegressor::with_window(window).unwrap().fit(&standardized),
        Err(RegressionError::WindowTooSmall {
            window,
            required: factors + 1
        })
    );
}

#[test]
fn test_alternating_example_minimizes_residuals() {
    let x = array![
        [1.0, 1.0],
        [-1.0, 1.0],
        [1.0, -1.0],
        [-1.0, -1.0],
        [1.0, 1.0],
        [-1.0, 1.0]
    ];
    let y = array![2.0, 0.0, 0.0, -2.0, 2.0, 0.0];
    let dates: Vec<NaiveDate> = (0..6).map(day).collect();
    let names = vec!["A".to_string(), "B".to_string()];
    let config = RollingConfig {
        window: 4,
        ..Default::default()
    };

    let trajectory = rolling_ols(&dates, &names, x.view(), y.view(), &config).unwrap();
    assert_eq!(trajectory.len(), 3);

    let rss = |start: usize, beta: &[f64]| -> f64 {
        (start..start + 4)
            .map(|r| {
                let fitted = x[[r, 0]] * beta[0] + x[[r, 1]] * beta[1];
                (y[r] - fitted).powi(2)
            })
            .sum()
    };

    for (start, record) in trajectory.iter().enumerate() {
        let best = rss(start, &record.coefficients);
        for (da, db) in [(1e-3, 0.0), (-1e-3, 0.0), (0.0, 1e-3), (0.0, -1e-3), (1e-3, -1e-3)] {
            let perturbed = [record.coefficients[0] + da, record.coefficients[1] + db];
            assert!(rss(start, &perturbed) >= best);
        }
    }
}

#[test]
fn test_normalized_paths_reach_one() {
    let rows = 80;
    let y = series("y", 0..rows, 0.29);
    let a = series("a", 0..rows, 0.13);
    let b = series("b", 0..rows, 0.61);
    let table = SeriesAligner::new().align(&y, &[a, b]).unwrap();
    let standardized = Standardizer::new().standardize(&table).unwrap();
    let trajectory = RollingRegressor::with_window(20)
        .unwrap()
        .fit(&standardized)
        .unwrap();
    let normalized = CoefficientNormalizer::new().normalize(trajectory).unwrap();

    let raw = normalized.raw().coefficients();
    for k in 0..2 {
        let scale = normalized.scales()[k];
        let path = normalized.normalized_factor(k);
        assert_eq!(path.iter().fold(0.0_f64, |acc, &c| acc.max(c.abs())), 1.0);
        for (i, &value) in path.iter().enumerate() {
            assert_eq!(value, raw[[i, k]] / scale);
        }
    }
}

#[test]
fn test_disjoint_series_fail_alignment() {
    let y = series("y", 0..10, 0.3);
    let a = series("a", 20..30, 0.3);
    assert_eq!(
        SeriesAligner::new().align(&y, &[a]),
        Err(RegressionError::EmptyAlignment)
    );
}

#[test]
fn test_zero_factor_trajectory_is_degenerate() {
    // y is orthogonal to the factor in every window, so its coefficient is exactly zero.
    let x = Array2::from_shape_vec((6, 1), vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
    let y = array![1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
    let dates: Vec<NaiveDate> = (0..6).map(day).collect();
    let config = RollingConfig {
        window: 2,
        parallel: false,
        rcond: None,
    };
    let trajectory = rolling_ols(&dates, &["flat".to_string()], x.view(), y.view(), &config)
        .unwrap();

    assert!(matches!(
        CoefficientNormalizer::new().normalize(trajectory),
        Err(RegressionError::DegenerateFactor { factor }) if factor == "flat"
    ));
}
