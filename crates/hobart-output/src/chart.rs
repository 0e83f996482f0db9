//! Chart data for external plotting tools.

use crate::export::{ExportError, ExportFormat, Exporter};
use chrono::NaiveDate;
use hobart_regression::{AlignedTable, CoefficientTrajectory, NormalizedTrajectory};
use serde::{Deserialize, Serialize};

/// One input series on the aligned dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    /// Series name.
    pub name: String,
    /// Observation dates.
    pub dates: Vec<NaiveDate>,
    /// Observed values, unstandardized.
    pub values: Vec<f64>,
}

/// Coefficient path of one factor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPath {
    /// Factor name.
    pub factor: String,
    /// Reference dates.
    pub dates: Vec<NaiveDate>,
    /// Raw coefficients.
    pub raw: Vec<f64>,
    /// Coefficients divided by the factor's maximum absolute coefficient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<Vec<f64>>,
}

/// Everything a plotting collaborator needs, as plain sequences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartExport {
    /// Window length in rows.
    pub window: usize,
    /// The dependent series followed by the factors.
    pub series: Vec<ChartSeries>,
    /// One coefficient path per factor.
    pub paths: Vec<ChartPath>,
}

impl ChartExport {
    /// Chart data with raw coefficient paths only.
    pub fn from_raw(aligned: &AlignedTable, trajectory: &CoefficientTrajectory) -> Self {
        Self {
            window: trajectory.window(),
            series: aligned_series(aligned),
            paths: paths(trajectory, None),
        }
    }

    /// Chart data with raw and normalized coefficient paths.
    pub fn from_normalized(aligned: &AlignedTable, trajectory: &NormalizedTrajectory) -> Self {
        Self {
            window: trajectory.raw().window(),
            series: aligned_series(aligned),
            paths: paths(trajectory.raw(), Some(trajectory)),
        }
    }
}

fn aligned_series(aligned: &AlignedTable) -> Vec<ChartSeries> {
    aligned
        .column_names()
        .iter()
        .enumerate()
        .map(|(j, name)| ChartSeries {
            name: name.clone(),
            dates: aligned.dates().to_vec(),
            values: aligned.column(j).to_vec(),
        })
        .collect()
}

fn paths(
    trajectory: &CoefficientTrajectory,
    normalized: Option<&NormalizedTrajectory>,
) -> Vec<ChartPath> {
    trajectory
        .factor_names()
        .iter()
        .enumerate()
        .map(|(k, factor)| ChartPath {
            factor: factor.clone(),
            dates: trajectory.dates().to_vec(),
            raw: trajectory.factor(k).to_vec(),
            normalized: normalized.map(|n| n.normalized_factor(k).to_vec()),
        })
        .collect()
}

impl Exporter for ChartExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => Err(ExportError::InvalidFormat(
                "chart data is only available as JSON".to_string(),
            )),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
