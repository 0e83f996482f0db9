//! Global z-score standardization.
//!
//! Each column of the aligned table is centered and scaled once, using
//! statistics over all rows, before any window is cut. Every window therefore
//! sees data on the same scale and coefficients are comparable across windows.
//!
//! The standard deviation is the sample estimator (divisor n - 1).

use crate::align::AlignedTable;
use crate::error::RegressionError;
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::Serialize;

/// Mean and standard deviation used to standardize one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    /// Column name.
    pub name: String,
    /// Column mean over all rows.
    pub mean: f64,
    /// Sample standard deviation over all rows.
    pub std_dev: f64,
}

/// An aligned table whose columns have mean 0 and sample standard deviation 1.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedTable {
    table: AlignedTable,
    stats: Vec<ColumnStats>,
}

impl StandardizedTable {
    /// Row dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        self.table.dates()
    }

    /// All column names, dependent first.
    pub fn column_names(&self) -> &[String] {
        self.table.column_names()
    }

    /// Name of the dependent column.
    pub fn dependent_name(&self) -> &str {
        self.table.dependent_name()
    }

    /// Names of the factor columns.
    pub fn factor_names(&self) -> &[String] {
        self.table.factor_names()
    }

    /// Number of rows (T).
    pub fn n_rows(&self) -> usize {
        self.table.n_rows()
    }

    /// Number of factors (K).
    pub fn n_factors(&self) -> usize {
        self.table.n_factors()
    }

    /// Standardized dependent column.
    pub fn dependent(&self) -> ArrayView1<'_, f64> {
        self.table.dependent()
    }

    /// Standardized factor columns (T x K).
    pub fn factors(&self) -> ArrayView2<'_, f64> {
        self.table.factors()
    }

    /// Whole standardized matrix, dependent in column 0.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.table.values()
    }

    /// Per-column statistics, in column order.
    pub fn stats(&self) -> &[ColumnStats] {
        &self.stats
    }
}

/// Z-scores every column of an aligned table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standardizer;

impl Standardizer {
    /// Create a new standardizer.
    pub const fn new() -> Self {
        Self
    }

    /// Standardize every column of `table`.
    ///
    /// # Errors
    /// * [`RegressionError::InsufficientData`] with fewer than two rows
    /// * [`RegressionError::DegenerateColumn`] for a constant column
    pub fn standardize(&self, table: &AlignedTable) -> Result<StandardizedTable, RegressionError> {
        let n = table.n_rows();
        if n < 2 {
            return Err(RegressionError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let mut values = Array2::<f64>::zeros((n, table.column_names().len()));
        let mut stats = Vec::with_capacity(table.column_names().len());

        for (j, name) in table.column_names().iter().enumerate() {
            let column = table.column(j);
            let (mean, std_dev) = mean_and_sample_std(column);

            if is_degenerate(column, mean, std_dev) {
                return Err(RegressionError::DegenerateColumn {
                    column: name.clone(),
                });
            }

            values
                .column_mut(j)
                .assign(&column.mapv(|x| (x - mean) / std_dev));
            stats.push(ColumnStats {
                name: name.clone(),
                mean,
                std_dev,
            });
        }

        tracing::debug!(
            rows = n,
            columns = stats.len(),
            "columns standardized"
        );
        Ok(StandardizedTable {
            table: table.with_values(values),
            stats,
        })
    }
}

fn mean_and_sample_std(column: ArrayView1<'_, f64>) -> (f64, f64) {
    let n = column.len() as f64;
    let mean = column.sum() / n;
    let sum_sq: f64 = column.iter().map(|&x| (x - mean).powi(2)).sum();
    (mean, (sum_sq / (n - 1.0)).sqrt())
}

/// A constant column may still produce a tiny non-zero deviation from
/// rounding in the mean, so equality of all entries is checked directly.
fn is_degenerate(column: ArrayView1<'_, f64>, mean: f64, std_dev: f64) -> bool {
    let first = column[0];
    std_dev == 0.0
        || !std_dev.is_finite()
        || column.iter().all(|&x| x == first)
        || std_dev <= f64::EPSILON * mean.abs()
}

/// Mean and sample standard deviation of every column of a matrix.
pub fn column_moments(values: ArrayView2<'_, f64>) -> Vec<(f64, f64)> {
    values
        .axis_iter(Axis(1))
        .map(mean_and_sample_std)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn table(values: Array2<f64>) -> AlignedTable {
        let dates = (0..values.nrows())
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64))
            .collect();
        let columns = (0..values.ncols()).map(|j| format!("c{}", j)).collect();
        AlignedTable::from_columns(dates, columns, values).unwrap()
    }

    #[test]
    fn test_standardized_columns_have_zero_mean_unit_std() {
        let aligned = table(array![
            [1.0, 10.0, -3.0],
            [2.0, 12.0, 5.0],
            [4.0, 9.0, 0.5],
            [8.0, 15.0, 2.0],
            [16.0, 11.0, -1.0]
        ]);
        let standardized = Standardizer::new().standardize(&aligned).unwrap();

        for (mean, std_dev) in column_moments(standardized.values()) {
            assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(std_dev, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_stats_use_sample_estimator() {
        let aligned = table(array![[1.0, 0.0], [2.0, 1.0], [3.0, 5.0]]);
        let standardized = Standardizer::new().standardize(&aligned).unwrap();
        let stats = &standardized.stats()[0];

        assert_eq!(stats.name, "c0");
        assert_abs_diff_eq!(stats.mean, 2.0, epsilon = 1e-15);
        // Sample variance of [1, 2, 3] is 1.
        assert_abs_diff_eq!(stats.std_dev, 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(standardized.dependent()[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_column_is_degenerate() {
        let aligned = table(array![[1.0, 0.1], [2.0, 0.1], [3.0, 0.1]]);
        assert_eq!(
            Standardizer::new().standardize(&aligned),
            Err(RegressionError::DegenerateColumn {
                column: "c1".to_string()
            })
        );
    }

    #[test]
    fn test_spread_below_mean_resolution_is_degenerate() {
        // 1e16 + 2 is one ulp above 1e16: the spread is rounding-level
        // relative to the mean even though the entries differ.
        let aligned = table(array![
            [1.0, 1e16],
            [2.0, 1e16 + 2.0],
            [0.0, 1e16],
            [3.0, 1e16 + 2.0]
        ]);
        assert_eq!(
            Standardizer::new().standardize(&aligned),
            Err(RegressionError::DegenerateColumn {
                column: "c1".to_string()
            })
        );
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let aligned = table(array![[1.0, 2.0]]);
        assert!(matches!(
            Standardizer::new().standardize(&aligned),
            Err(RegressionError::InsufficientData {
                required: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_names_and_dates_are_kept() {
        let aligned = table(array![[1.0, 2.0], [2.0, 1.0], [0.0, 4.0]]);
        let standardized = Standardizer::new().standardize(&aligned).unwrap();
        assert_eq!(standardized.dates(), aligned.dates());
        assert_eq!(standardized.factor_names(), aligned.factor_names());
        assert_eq!(standardized.dependent_name(), "c0");
    }
}
