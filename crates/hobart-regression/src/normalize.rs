//! Per-factor scaling of coefficient paths.
//!
//! Each factor's coefficients are divided by that factor's own largest
//! absolute coefficient, so every path lies in [-1, 1] and reaches ±1 at
//! least once. Signs and shapes stay comparable across factors; magnitudes do
//! not.
//!
//! Coefficients are in standardized units, so a path whose largest magnitude
//! is at most [`ZERO_TOLERANCE`] times `max(1, largest scale of any factor)`
//! is rounding noise around zero and is rejected as degenerate.

use crate::error::RegressionError;
use crate::trajectory::CoefficientTrajectory;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

/// Relative magnitude below which a coefficient path counts as zero.
pub const ZERO_TOLERANCE: f64 = 1e-12;

/// A coefficient trajectory together with its per-factor normalized form.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTrajectory {
    trajectory: CoefficientTrajectory,
    normalized: Array2<f64>,
    scales: Array1<f64>,
}

impl NormalizedTrajectory {
    /// The raw trajectory.
    pub const fn raw(&self) -> &CoefficientTrajectory {
        &self.trajectory
    }

    /// Normalized coefficients (windows x factors).
    pub fn normalized(&self) -> ArrayView2<'_, f64> {
        self.normalized.view()
    }

    /// Normalized path of factor `k`.
    pub fn normalized_factor(&self, k: usize) -> ArrayView1<'_, f64> {
        self.normalized.column(k)
    }

    /// Largest absolute raw coefficient of each factor.
    pub fn scales(&self) -> ArrayView1<'_, f64> {
        self.scales.view()
    }
}

/// Scales each factor's coefficient path by its maximum absolute value.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoefficientNormalizer;

impl CoefficientNormalizer {
    /// Create a new normalizer.
    pub const fn new() -> Self {
        Self
    }

    /// Normalize every factor of `trajectory`.
    ///
    /// # Errors
    /// Returns [`RegressionError::DegenerateFactor`] for the first factor whose
    /// coefficient is zero, within [`ZERO_TOLERANCE`], in every window.
    pub fn normalize(
        &self,
        trajectory: CoefficientTrajectory,
    ) -> Result<NormalizedTrajectory, RegressionError> {
        let raw = trajectory.coefficients();
        let scales = raw.map_axis(Axis(0), |path| {
            path.iter().fold(0.0_f64, |acc, &c| acc.max(c.abs()))
        });

        let largest = scales.iter().copied().fold(1.0_f64, f64::max);
        let floor = ZERO_TOLERANCE * largest;
        if let Some(k) = scales
            .iter()
            .position(|&scale| scale <= floor || !scale.is_finite())
        {
            return Err(RegressionError::DegenerateFactor {
                factor: trajectory.factor_names()[k].clone(),
            });
        }

        let mut normalized = raw.to_owned();
        Zip::from(normalized.columns_mut())
            .and(&scales)
            .for_each(|mut path, &scale| path.mapv_inplace(|c| c / scale));

        tracing::debug!(factors = scales.len(), "coefficients normalized");
        Ok(NormalizedTrajectory {
            trajectory,
            normalized,
            scales,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ndarray::array;

    fn trajectory(coefficients: Array2<f64>) -> CoefficientTrajectory {
        let n = coefficients.nrows();
        let k = coefficients.ncols();
        let dates = (0..n)
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64))
            .collect();
        let names = (0..k).map(|j| format!("f{}", j)).collect();
        CoefficientTrajectory::new(dates, names, k + 1, coefficients, vec![k; n])
    }

    #[test]
    fn test_each_factor_scaled_by_own_max() {
        let raw = array![[0.5, -4.0], [-2.0, 1.0], [1.0, 2.0]];
        let normalized = CoefficientNormalizer::new()
            .normalize(trajectory(raw.clone()))
            .unwrap();

        assert_eq!(normalized.scales(), array![2.0, 4.0]);
        assert_eq!(
            normalized.normalized(),
            array![[0.25, -1.0], [-1.0, 0.25], [0.5, 0.5]]
        );
        assert_eq!(normalized.raw().coefficients(), raw);
    }

    #[test]
    fn test_max_abs_is_one() {
        let raw = array![[0.3, 7.0], [-0.9, 3.5], [0.6, -1.0]];
        let normalized = CoefficientNormalizer::new().normalize(trajectory(raw)).unwrap();

        for k in 0..2 {
            let max = normalized
                .normalized_factor(k)
                .iter()
                .fold(0.0_f64, |acc, &c| acc.max(c.abs()));
            assert_eq!(max, 1.0);
        }
    }

    #[test]
    fn test_all_zero_factor_is_degenerate() {
        let raw = array![[1.0, 0.0], [2.0, 0.0]];
        assert_eq!(
            CoefficientNormalizer::new().normalize(trajectory(raw)),
            Err(RegressionError::DegenerateFactor {
                factor: "f1".to_string()
            })
        );
    }

    #[test]
    fn test_rounding_noise_factor_is_degenerate() {
        let raw = array![[0.8, 1e-17], [-1.2, -3e-17], [0.4, 2e-17]];
        assert_eq!(
            CoefficientNormalizer::new().normalize(trajectory(raw)),
            Err(RegressionError::DegenerateFactor {
                factor: "f1".to_string()
            })
        );
    }

    #[test]
    fn test_small_but_real_factor_is_scaled() {
        let raw = array![[0.8, 1e-6], [-1.2, -4e-6]];
        let normalized = CoefficientNormalizer::new().normalize(trajectory(raw)).unwrap();
        assert_eq!(normalized.scales()[1], 4e-6);
        assert_eq!(normalized.normalized_factor(1)[1], -1.0);
    }
}
