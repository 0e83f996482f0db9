//! Date alignment of independently sourced series.
//!
//! The aligner keeps exactly the dates on which every series has a finite
//! value. A date missing from any series, or present with a missing (NaN)
//! value, is dropped from the whole table; gaps are never filled.

use crate::error::RegressionError;
use chrono::NaiveDate;
use hobart_data::TimeSeries;
use ndarray::{Array2, ArrayView1, ArrayView2, s};
use std::collections::HashSet;

/// Rectangular table of one dependent column followed by K factor columns.
///
/// Invariants: dates strictly increasing, every value finite, column 0 is the
/// dependent series and columns `1..=K` the factors in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl AlignedTable {
    /// Build a table from data that is already aligned.
    ///
    /// # Arguments
    /// * `dates` - Row dates, strictly increasing
    /// * `columns` - Column names: dependent first, then factors
    /// * `values` - Rows x columns matrix of finite values
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self, RegressionError> {
        if columns.len() < 2 {
            return Err(RegressionError::NoFactors);
        }
        check_unique(&columns)?;
        if values.ncols() != columns.len() {
            return Err(RegressionError::DimensionMismatch {
                expected: columns.len(),
                actual: values.ncols(),
            });
        }
        if values.nrows() != dates.len() {
            return Err(RegressionError::DimensionMismatch {
                expected: dates.len(),
                actual: values.nrows(),
            });
        }
        if dates.is_empty() {
            return Err(RegressionError::EmptyAlignment);
        }
        if let Some(pair) = dates.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(RegressionError::InvalidTable(format!(
                "dates are not strictly increasing at {}",
                pair[1]
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RegressionError::InvalidTable(
                "table contains missing or non-finite values".to_string(),
            ));
        }

        Ok(Self {
            dates,
            columns,
            values,
        })
    }

    /// Row dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// All column names, dependent first.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Name of the dependent column.
    pub fn dependent_name(&self) -> &str {
        &self.columns[0]
    }

    /// Names of the factor columns.
    pub fn factor_names(&self) -> &[String] {
        &self.columns[1..]
    }

    /// Number of rows (T).
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of factors (K).
    pub fn n_factors(&self) -> usize {
        self.values.ncols() - 1
    }

    /// Whole matrix, dependent in column 0.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Dependent column.
    pub fn dependent(&self) -> ArrayView1<'_, f64> {
        self.values.column(0)
    }

    /// Factor columns (T x K).
    pub fn factors(&self) -> ArrayView2<'_, f64> {
        self.values.slice(s![.., 1..])
    }

    /// Column `j` (0 is the dependent).
    pub fn column(&self, j: usize) -> ArrayView1<'_, f64> {
        self.values.column(j)
    }

    pub(crate) fn with_values(&self, values: Array2<f64>) -> Self {
        debug_assert_eq!(values.dim(), self.values.dim());
        Self {
            dates: self.dates.clone(),
            columns: self.columns.clone(),
            values,
        }
    }
}

/// Intersects series on their dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesAligner;

impl SeriesAligner {
    /// Create a new aligner.
    pub const fn new() -> Self {
        Self
    }

    /// Align a dependent series with its factors.
    ///
    /// Column order of the result follows the arguments: the dependent series
    /// first, then `factors` in the given order. Rows are the dates on which
    /// every series has a finite value, ascending.
    ///
    /// # Errors
    /// * [`RegressionError::NoFactors`] if `factors` is empty
    /// * [`RegressionError::DuplicateColumn`] if two series share a name
    /// * [`RegressionError::EmptyAlignment`] if no date survives
    pub fn align(
        &self,
        dependent: &TimeSeries,
        factors: &[TimeSeries],
    ) -> Result<AlignedTable, RegressionError> {
        if factors.is_empty() {
            return Err(RegressionError::NoFactors);
        }

        let columns: Vec<String> = std::iter::once(dependent)
            .chain(factors)
            .map(|series| series.name().to_string())
            .collect();
        check_unique(&columns)?;

        let width = columns.len();
        let mut dates = Vec::new();
        let mut cells = Vec::new();
        let mut row = Vec::with_capacity(width);

        // Walking the dependent series keeps the output ascending.
        'dates: for (date, value) in dependent.iter() {
            if !value.is_finite() {
                continue;
            }
            row.clear();
            row.push(value);
            for factor in factors {
                match factor.get(date) {
                    Some(v) if v.is_finite() => row.push(v),
                    _ => continue 'dates,
                }
            }
            dates.push(date);
            cells.extend_from_slice(&row);
        }

        if dates.is_empty() {
            tracing::debug!(
                dependent = dependent.name(),
                factors = factors.len(),
                "no common dates"
            );
            return Err(RegressionError::EmptyAlignment);
        }

        for series in std::iter::once(dependent).chain(factors) {
            let dropped = series.len() - dates.len();
            if dropped > 0 {
                tracing::warn!(series = series.name(), dropped, "dates dropped by alignment");
            }
        }

        let values = Array2::from_shape_vec((dates.len(), width), cells)
            .map_err(|e| RegressionError::InvalidTable(e.to_string()))?;

        tracing::debug!(rows = dates.len(), factors = factors.len(), "series aligned");
        Ok(AlignedTable {
            dates,
            columns,
            values,
        })
    }
}

fn check_unique(columns: &[String]) -> Result<(), RegressionError> {
    let mut seen = HashSet::with_capacity(columns.len());
    for name in columns {
        if !seen.insert(name.as_str()) {
            return Err(RegressionError::DuplicateColumn {
                column: name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn series(name: &str, points: &[(u32, f64)]) -> TimeSeries {
        TimeSeries::from_points(name, points.iter().map(|&(day, v)| (d(day), v))).unwrap()
    }

    #[test]
    fn test_align_intersects_dates() {
        let y = series("y", &[(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)]);
        let a = series("a", &[(2, 20.0), (3, 30.0), (4, 40.0), (5, 50.0)]);
        let b = series("b", &[(1, 100.0), (3, 300.0), (4, 400.0)]);

        let table = SeriesAligner::new().align(&y, &[a, b]).unwrap();

        assert_eq!(table.dates(), &[d(3), d(4)]);
        assert_eq!(table.column_names(), &["y", "a", "b"]);
        assert_eq!(table.values(), array![[3.0, 30.0, 300.0], [4.0, 40.0, 400.0]]);
    }

    #[test]
    fn test_align_drops_missing_values() {
        let y = series("y", &[(1, 1.0), (2, f64::NAN), (3, 3.0)]);
        let a = series("a", &[(1, f64::NAN), (2, 2.0), (3, 30.0)]);

        let table = SeriesAligner::new().align(&y, &[a]).unwrap();

        assert_eq!(table.dates(), &[d(3)]);
        assert_eq!(table.dependent().to_vec(), vec![3.0]);
    }

    #[test]
    fn test_align_disjoint_ranges() {
        let y = series("y", &[(1, 1.0), (2, 2.0)]);
        let a = series("a", &[(3, 3.0), (4, 4.0)]);

        assert_eq!(
            SeriesAligner::new().align(&y, &[a]),
            Err(RegressionError::EmptyAlignment)
        );
    }

    #[test]
    fn test_align_requires_factors() {
        let y = series("y", &[(1, 1.0)]);
        assert_eq!(
            SeriesAligner::new().align(&y, &[]),
            Err(RegressionError::NoFactors)
        );
    }

    #[test]
    fn test_align_rejects_duplicate_names() {
        let y = series("y", &[(1, 1.0)]);
        let a = series("a", &[(1, 1.0)]);
        assert!(matches!(
            SeriesAligner::new().align(&y, &[a.clone(), a]),
            Err(RegressionError::DuplicateColumn { column }) if column == "a"
        ));
    }

    #[test]
    fn test_factor_order_is_preserved() {
        let y = series("y", &[(1, 1.0), (2, 2.0)]);
        let a = series("a", &[(1, 10.0), (2, 20.0)]);
        let b = series("b", &[(1, 100.0), (2, 200.0)]);

        let ab = SeriesAligner::new().align(&y, &[a.clone(), b.clone()]).unwrap();
        let ba = SeriesAligner::new().align(&y, &[b, a]).unwrap();

        assert_eq!(ab.dates(), ba.dates());
        assert_eq!(ab.factor_names(), &["a", "b"]);
        assert_eq!(ba.factor_names(), &["b", "a"]);
        assert_eq!(ab.column(1), ba.column(2));
    }

    #[test]
    fn test_from_columns_validates() {
        let names = vec!["y".to_string(), "a".to_string()];
        let ok = AlignedTable::from_columns(
            vec![d(1), d(2)],
            names.clone(),
            array![[1.0, 2.0], [3.0, 4.0]],
        )
        .unwrap();
        assert_eq!(ok.n_rows(), 2);
        assert_eq!(ok.n_factors(), 1);
        assert_eq!(ok.factors(), array![[2.0], [4.0]]);

        assert!(matches!(
            AlignedTable::from_columns(
                vec![d(2), d(1)],
                names.clone(),
                array![[1.0, 2.0], [3.0, 4.0]]
            ),
            Err(RegressionError::InvalidTable(_))
        ));
        assert!(matches!(
            AlignedTable::from_columns(
                vec![d(1), d(2)],
                names,
                array![[1.0, f64::NAN], [3.0, 4.0]]
            ),
            Err(RegressionError::InvalidTable(_))
        ));
    }
}
