//! Least squares via one-sided Jacobi SVD
//!
//! Every window is solved through the singular value decomposition of its
//! design matrix rather than the normal equations, so the solver never needs
//! `XᵀX` to be invertible. Singular values at or below
//! `rcond * σ_max` are treated as zero, which yields the minimum-norm
//! solution of `min ‖y − Xβ‖²` when the window is rank-deficient
//! (collinear or all-zero factors).
//!
//! The decomposition uses Hestenes' one-sided Jacobi method: plane rotations
//! are applied to pairs of columns of `X` until all columns are mutually
//! orthogonal. The accumulated rotations form `V`, the column norms are the
//! singular values and the normalized columns form `U`.

use crate::error::RegressionError;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Maximum number of Jacobi sweeps over all column pairs.
pub const MAX_SWEEPS: usize = 60;

/// Relative orthogonality threshold at which a column pair is left alone.
pub const ORTHOGONALITY_TOLERANCE: f64 = 1e-15;

/// Thin singular value decomposition `A = U Σ Vᵀ`.
#[derive(Debug, Clone)]
pub struct Svd {
    /// Left singular vectors (m x n). Columns for zero singular values are zero.
    pub u: Array2<f64>,
    /// Singular values, in column order (not sorted).
    pub singular_values: Array1<f64>,
    /// Right singular vectors (n x n), one per column.
    pub v: Array2<f64>,
}

/// Solution of a least-squares problem.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    /// Minimum-norm coefficient vector.
    pub coefficients: Array1<f64>,
    /// Numerical rank of the design matrix.
    pub rank: usize,
    /// Singular values of the design matrix.
    pub singular_values: Array1<f64>,
}

impl LeastSquares {
    /// Whether the design matrix had fewer independent columns than columns.
    pub fn is_rank_deficient(&self) -> bool {
        self.rank < self.coefficients.len()
    }
}

/// Default relative cutoff for an `m x n` design matrix: `max(m, n) · ε`.
pub fn default_rcond(rows: usize, cols: usize) -> f64 {
    rows.max(cols) as f64 * f64::EPSILON
}

/// One-sided Jacobi SVD of an `m x n` matrix.
///
/// # Arguments
/// * `a` - Matrix to decompose
/// * `max_sweeps` - Maximum number of sweeps over all column pairs
/// * `tolerance` - Relative orthogonality threshold for a column pair
pub fn jacobi_svd(a: ArrayView2<'_, f64>, max_sweeps: usize, tolerance: f64) -> Svd {
    let n = a.ncols();
    let mut u = a.to_owned();
    let mut v = Array2::<f64>::eye(n);

    for _sweep in 0..max_sweeps {
        let mut rotated = false;

        for p in 0..n {
            for q in (p + 1)..n {
                let (alpha, beta, gamma) = column_products(&u, p, q);

                // Zero columns are already orthogonal to everything.
                if alpha == 0.0 || beta == 0.0 {
                    continue;
                }
                if gamma.abs() <= tolerance * (alpha * beta).sqrt() {
                    continue;
                }

                let (cos_theta, sin_theta) = compute_rotation(alpha, beta, gamma);
                rotate_columns(&mut u, p, q, cos_theta, sin_theta);
                rotate_columns(&mut v, p, q, cos_theta, sin_theta);
                rotated = true;
            }
        }

        if !rotated {
            break;
        }
    }

    let mut singular_values = Array1::<f64>::zeros(n);
    for (j, mut column) in u.axis_iter_mut(Axis(1)).enumerate() {
        let norm = column.dot(&column).sqrt();
        singular_values[j] = norm;
        if norm > 0.0 {
            column.mapv_inplace(|x| x / norm);
        }
    }

    Svd {
        u,
        singular_values,
        v,
    }
}

/// Solve `min ‖y − Xβ‖²` for the minimum-norm `β`.
///
/// # Arguments
/// * `x` - Design matrix (m x n)
/// * `y` - Response vector (m)
/// * `rcond` - Relative singular value cutoff; `None` uses [`default_rcond`]
///
/// # Errors
/// Returns [`RegressionError::DimensionMismatch`] if `y` does not have one
/// entry per row of `x`, and [`RegressionError::InvalidParameter`] for a
/// negative or non-finite `rcond`.
pub fn lstsq(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    rcond: Option<f64>,
) -> Result<LeastSquares, RegressionError> {
    if x.nrows() != y.len() {
        return Err(RegressionError::DimensionMismatch {
            expected: x.nrows(),
            actual: y.len(),
        });
    }
    validate_rcond(rcond)?;

    Ok(solve_min_norm(x, y, rcond))
}

pub(crate) fn validate_rcond(rcond: Option<f64>) -> Result<(), RegressionError> {
    match rcond {
        Some(rcond) if !rcond.is_finite() || rcond < 0.0 => Err(
            RegressionError::InvalidParameter(format!(
                "rcond must be finite and non-negative, got {}",
                rcond
            )),
        ),
        _ => Ok(()),
    }
}

/// [`lstsq`] without input validation, for callers that build `x` and `y`
/// from the same table.
pub(crate) fn solve_min_norm(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    rcond: Option<f64>,
) -> LeastSquares {
    let (m, n) = x.dim();
    let svd = jacobi_svd(x, MAX_SWEEPS, ORTHOGONALITY_TOLERANCE);

    let sigma_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let cutoff = rcond.unwrap_or_else(|| default_rcond(m, n)) * sigma_max;

    // β = Σ_{σ_j > cutoff} v_j (u_jᵀ y) / σ_j
    let mut coefficients = Array1::<f64>::zeros(n);
    let mut rank = 0;
    for (j, &sigma) in svd.singular_values.iter().enumerate() {
        if sigma <= cutoff || sigma == 0.0 {
            continue;
        }
        rank += 1;
        let weight = svd.u.column(j).dot(&y) / sigma;
        coefficients.scaled_add(weight, &svd.v.column(j));
    }

    LeastSquares {
        coefficients,
        rank,
        singular_values: svd.singular_values,
    }
}

/// Squared norms of columns `p` and `q` and their inner product.
fn column_products(matrix: &Array2<f64>, p: usize, q: usize) -> (f64, f64, f64) {
    let col_p = matrix.column(p);
    let col_q = matrix.column(q);
    (col_p.dot(&col_p), col_q.dot(&col_q), col_p.dot(&col_q))
}

/// Compute the rotation (cos, sin) that makes columns `p` and `q` orthogonal
/// Returns (cos_theta, sin_theta) tuple
fn compute_rotation(alpha: f64, beta: f64, gamma: f64) -> (f64, f64) {
    let zeta = (beta - alpha) / (2.0 * gamma);
    let t = if zeta >= 0.0 {
        1.0 / (zeta + (1.0 + zeta * zeta).sqrt())
    } else {
        -1.0 / (-zeta + (1.0 + zeta * zeta).sqrt())
    };

    // cos = 1/sqrt(1 + t^2), sin = t * cos
    let cos_theta = 1.0 / (1.0 + t * t).sqrt();
    let sin_theta = t * cos_theta;

    (cos_theta, sin_theta)
}

/// Apply a plane rotation to columns `p` and `q`
fn rotate_columns(matrix: &mut Array2<f64>, p: usize, q: usize, cos_theta: f64, sin_theta: f64) {
    for i in 0..matrix.nrows() {
        let a_ip = matrix[[i, p]];
        let a_iq = matrix[[i, q]];

        matrix[[i, p]] = cos_theta * a_ip - sin_theta * a_iq;
        matrix[[i, q]] = sin_theta * a_ip + cos_theta * a_iq;
    }
}
