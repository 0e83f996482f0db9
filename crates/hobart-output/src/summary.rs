//! Console summary of coefficient trajectories.

use chrono::NaiveDate;
use hobart_regression::{CoefficientTrajectory, NormalizedTrajectory};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistics of one factor's raw coefficient path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorSummary {
    /// Name of the factor.
    pub factor: String,

    /// Mean coefficient over all windows.
    pub mean: f64,

    /// Smallest coefficient.
    pub min: f64,

    /// Largest coefficient.
    pub max: f64,

    /// Coefficient of the most recent window.
    pub latest: f64,

    /// Normalization scale (maximum absolute coefficient), if normalized.
    pub scale: Option<f64>,
}

impl FactorSummary {
    fn from_path(factor: &str, path: ArrayView1<'_, f64>, scale: Option<f64>) -> Self {
        let n = path.len().max(1) as f64;
        Self {
            factor: factor.to_string(),
            mean: path.sum() / n,
            min: path.iter().copied().fold(f64::INFINITY, f64::min),
            max: path.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            latest: path.iter().last().copied().unwrap_or(f64::NAN),
            scale,
        }
    }

    /// Latest coefficient divided by the normalization scale.
    pub fn latest_normalized(&self) -> Option<f64> {
        self.scale.map(|scale| self.latest / scale)
    }

    fn scale_columns(&self) -> (String, String) {
        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v));
        (fmt(self.scale), fmt(self.latest_normalized()))
    }
}

impl fmt::Display for FactorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: latest {:.4} (mean {:.4}, range {:.4} to {:.4})",
            self.factor, self.latest, self.mean, self.min, self.max
        )
    }
}

/// Summary of a rolling attribution run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrajectorySummary {
    /// Name of the dependent series.
    pub dependent: String,

    /// Window length in rows.
    pub window: usize,

    /// Number of windows.
    pub windows: usize,

    /// Windows solved with a rank-deficient design.
    pub rank_deficient: usize,

    /// First reference date.
    pub first_date: Option<NaiveDate>,

    /// Last reference date.
    pub last_date: Option<NaiveDate>,

    /// Per-factor statistics, in factor order.
    pub factors: Vec<FactorSummary>,
}

impl TrajectorySummary {
    /// Summarize raw coefficients.
    pub fn from_raw(dependent: impl Into<String>, trajectory: &CoefficientTrajectory) -> Self {
        Self::build(dependent.into(), trajectory, None)
    }

    /// Summarize raw coefficients and record each factor's normalization scale.
    pub fn from_normalized(dependent: impl Into<String>, trajectory: &NormalizedTrajectory) -> Self {
        let scales = trajectory.scales().to_vec();
        Self::build(dependent.into(), trajectory.raw(), Some(&scales))
    }

    fn build(
        dependent: String,
        trajectory: &CoefficientTrajectory,
        scales: Option<&[f64]>,
    ) -> Self {
        let factors = trajectory
            .factor_names()
            .iter()
            .enumerate()
            .map(|(k, name)| {
                let scale = scales.and_then(|s| s.get(k).copied());
                FactorSummary::from_path(name, trajectory.factor(k), scale)
            })
            .collect();

        Self {
            dependent,
            window: trajectory.window(),
            windows: trajectory.len(),
            rank_deficient: trajectory.rank_deficient_windows(),
            first_date: trajectory.dates().first().copied(),
            last_date: trajectory.dates().last().copied(),
            factors,
        }
    }

    fn period(&self) -> String {
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => format!("{} to {}", first, last),
            _ => "n/a".to_string(),
        }
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nRolling Attribution: {}\n", self.dependent));
        output.push_str(&format!("Period: {}\n", self.period()));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str(&format!(
            "  Window:                   {} rows\n",
            self.window
        ));
        output.push_str(&format!("  Windows:                  {}\n", self.windows));
        if self.rank_deficient > 0 {
            output.push_str(&format!(
                "  Rank-deficient windows:   {}\n",
                self.rank_deficient
            ));
        }

        output.push_str("\nCoefficients:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "{:<16} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
            "Factor", "Latest", "Mean", "Min", "Max", "Scale", "Norm"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');

        for factor in &self.factors {
            let (scale, norm) = factor.scale_columns();
            output.push_str(&format!(
                "{:<16} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10} {:>10}\n",
                factor.factor, factor.latest, factor.mean, factor.min, factor.max, scale, norm
            ));
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Rolling Attribution: {}\n\n", self.dependent));
        output.push_str(&format!("**Period:** {}\n\n", self.period()));
        output.push_str(&format!("- **Window:** {} rows\n", self.window));
        output.push_str(&format!("- **Windows:** {}\n", self.windows));
        output.push_str(&format!(
            "- **Rank-deficient windows:** {}\n\n",
            self.rank_deficient
        ));

        output.push_str("## Coefficients\n\n");
        output.push_str("| Factor | Latest | Mean | Min | Max | Scale | Norm |\n");
        output.push_str("|--------|--------|------|-----|-----|-------|------|\n");
        for factor in &self.factors {
            let (scale, norm) = factor.scale_columns();
            output.push_str(&format!(
                "| {} | {:.4} | {:.4} | {:.4} | {:.4} | {} | {} |\n",
                factor.factor, factor.latest, factor.mean, factor.min, factor.max, scale, norm
            ));
        }

        output
    }
}

impl fmt::Display for TrajectorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Rolling Attribution: {} ({}, window {})",
            self.dependent,
            self.period(),
            self.window
        )?;
        for factor in &self.factors {
            writeln!(f, "  {}", factor)?;
        }
        Ok(())
    }
}
