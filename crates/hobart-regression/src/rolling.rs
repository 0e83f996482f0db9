//! Rolling-window least squares
//!
//! For a table of T rows and window length W, window `i` covers rows
//! `[i, i + W)` for `i` in `0..=T-W` and is stamped with the date of row
//! `i + W - 1`. Each window is fitted from scratch with equal weights and no
//! intercept: the standardized columns are already centered over the full
//! table, and whatever mean remains inside a window is absorbed into the
//! residual.
//!
//! The coefficient matrix is allocated up front (windows x factors) and each
//! row is written only by its own window, so windows can be fitted in
//! parallel without changing the result.

use crate::error::RegressionError;
use crate::linalg::{solve_min_norm, validate_rcond};
use crate::standardize::StandardizedTable;
use crate::trajectory::CoefficientTrajectory;
use chrono::NaiveDate;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Zip, s};
use serde::{Deserialize, Serialize};

/// Rolling regression configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingConfig {
    /// Window length in rows (default: 60, about one quarter of trading days)
    pub window: usize,

    /// Fit windows on the rayon thread pool (default: true)
    pub parallel: bool,

    /// Relative singular value cutoff; `None` uses `max(W, K) * ε`
    pub rcond: Option<f64>,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            window: 60,
            parallel: true,
            rcond: None,
        }
    }
}

/// Fits one least-squares model per trailing window.
#[derive(Debug, Clone)]
pub struct RollingRegressor {
    config: RollingConfig,
}

impl RollingRegressor {
    /// Create a regressor with the given configuration.
    pub fn new(config: RollingConfig) -> Result<Self, RegressionError> {
        if config.window == 0 {
            return Err(RegressionError::InvalidParameter(
                "window must be at least one row".to_string(),
            ));
        }
        validate_rcond(config.rcond)?;
        Ok(Self { config })
    }

    /// Create a regressor with the default configuration and window `window`.
    pub fn with_window(window: usize) -> Result<Self, RegressionError> {
        Self::new(RollingConfig {
            window,
            ..Default::default()
        })
    }

    /// Get the configuration.
    pub const fn config(&self) -> &RollingConfig {
        &self.config
    }

    /// Fit every window of a standardized table.
    pub fn fit(&self, table: &StandardizedTable) -> Result<CoefficientTrajectory, RegressionError> {
        rolling_ols(
            table.dates(),
            table.factor_names(),
            table.factors(),
            table.dependent(),
            &self.config,
        )
    }
}

/// Fit `y` on the columns of `x` over every window of `config.window` rows.
///
/// # Arguments
/// * `dates` - One date per row, ascending
/// * `factor_names` - One name per column of `x`
/// * `x` - Factor matrix (T x K)
/// * `y` - Dependent vector (T)
/// * `config` - Window length, parallelism and singular value cutoff
///
/// # Errors
/// * [`RegressionError::NoFactors`] if `x` has no columns
/// * [`RegressionError::WindowTooSmall`] if `W < K + 1`
/// * [`RegressionError::InsufficientData`] if `T < W`
/// * [`RegressionError::DimensionMismatch`] if the inputs disagree on T or K
pub fn rolling_ols(
    dates: &[NaiveDate],
    factor_names: &[String],
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    config: &RollingConfig,
) -> Result<CoefficientTrajectory, RegressionError> {
    let (n_rows, n_factors) = x.dim();
    let window = config.window;

    if n_factors == 0 {
        return Err(RegressionError::NoFactors);
    }
    validate_rcond(config.rcond)?;
    if factor_names.len() != n_factors {
        return Err(RegressionError::DimensionMismatch {
            expected: n_factors,
            actual: factor_names.len(),
        });
    }
    for len in [y.len(), dates.len()] {
        if len != n_rows {
            return Err(RegressionError::DimensionMismatch {
                expected: n_rows,
                actual: len,
            });
        }
    }
    if let Some(pair) = dates.windows(2).find(|pair| pair[1] <= pair[0]) {
        return Err(RegressionError::InvalidTable(format!(
            "dates are not strictly increasing at {}",
            pair[1]
        )));
    }
    if window < n_factors + 1 {
        return Err(RegressionError::WindowTooSmall {
            window,
            required: n_factors + 1,
        });
    }
    if n_rows < window {
        return Err(RegressionError::InsufficientData {
            required: window,
            actual: n_rows,
        });
    }

    let n_windows = n_rows - window + 1;
    let mut coefficients = Array2::<f64>::zeros((n_windows, n_factors));
    let mut ranks = Array1::<usize>::zeros(n_windows);

    let fit_window = |i: usize, mut row: ArrayViewMut1<'_, f64>, rank: &mut usize| {
        let rows = s![i..i + window, ..];
        let solution = solve_min_norm(x.slice(rows), y.slice(s![i..i + window]), config.rcond);
        row.assign(&solution.coefficients);
        *rank = solution.rank;
    };

    let zip = Zip::indexed(coefficients.rows_mut()).and(&mut ranks);
    if config.parallel {
        zip.par_for_each(fit_window);
    } else {
        zip.for_each(fit_window);
    }

    let ranks = ranks.to_vec();
    let deficient = ranks.iter().filter(|&&rank| rank < n_factors).count();
    if deficient > 0 {
        tracing::warn!(
            windows = deficient,
            "rank-deficient windows solved with the minimum-norm solution"
        );
    }

    tracing::debug!(
        rows = n_rows,
        factors = n_factors,
        window,
        windows = n_windows,
        "rolling regression complete"
    );

    Ok(CoefficientTrajectory::new(
        dates[window - 1..].to_vec(),
        factor_names.to_vec(),
        window,
        coefficients,
        ranks,
    ))
}
