//! Coefficient trajectories.

use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::Serialize;

/// Coefficients of one window, stamped with the date of the window's last row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowCoefficients {
    /// Reference date (last row of the window).
    pub date: NaiveDate,
    /// One coefficient per factor, in factor order.
    pub coefficients: Vec<f64>,
}

/// Per-window regression coefficients, ordered by reference date.
///
/// Row `i` holds the fit of the window covering table rows `[i, i + W)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTrajectory {
    dates: Vec<NaiveDate>,
    factor_names: Vec<String>,
    window: usize,
    coefficients: Array2<f64>,
    ranks: Vec<usize>,
}

impl CoefficientTrajectory {
    pub(crate) fn new(
        dates: Vec<NaiveDate>,
        factor_names: Vec<String>,
        window: usize,
        coefficients: Array2<f64>,
        ranks: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(dates.len(), coefficients.nrows());
        debug_assert_eq!(factor_names.len(), coefficients.ncols());
        debug_assert_eq!(ranks.len(), coefficients.nrows());
        Self {
            dates,
            factor_names,
            window,
            coefficients,
            ranks,
        }
    }

    /// Number of windows.
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether there are no windows.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Window length used for the fits.
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Reference dates, strictly increasing.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Factor names, in coefficient column order.
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// Raw coefficients (windows x factors).
    pub fn coefficients(&self) -> ArrayView2<'_, f64> {
        self.coefficients.view()
    }

    /// Coefficient path of factor `k` across all windows.
    pub fn factor(&self, k: usize) -> ArrayView1<'_, f64> {
        self.coefficients.column(k)
    }

    /// Numerical rank of each window's design matrix.
    pub fn ranks(&self) -> &[usize] {
        &self.ranks
    }

    /// Number of windows whose design matrix was rank-deficient.
    pub fn rank_deficient_windows(&self) -> usize {
        let full = self.factor_names.len();
        self.ranks.iter().filter(|&&rank| rank < full).count()
    }

    /// Record for window `i`.
    pub fn get(&self, i: usize) -> Option<WindowCoefficients> {
        let date = *self.dates.get(i)?;
        Some(WindowCoefficients {
            date,
            coefficients: self.coefficients.row(i).to_vec(),
        })
    }

    /// Iterate over per-window records in date order.
    pub fn iter(&self) -> impl Iterator<Item = WindowCoefficients> + '_ {
        self.dates
            .iter()
            .zip(self.coefficients.rows())
            .map(|(&date, row)| WindowCoefficients {
                date,
                coefficients: row.to_vec(),
            })
    }
}
