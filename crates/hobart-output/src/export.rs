//! Export of coefficient trajectories.
//!
//! A trajectory is flattened to one row per reference date. CSV output has a
//! `date` column, then one `coef_<factor>` column per factor and, when
//! normalized coefficients are present, one `coef_<factor>_norm` column per
//! factor. JSON output carries the same rows plus the dependent name, the
//! factor names and the window length.

use chrono::NaiveDate;
use hobart_regression::{CoefficientTrajectory, NormalizedTrajectory};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized output was not valid UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Comma-separated values format.
    #[default]
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Guess the format from a file extension, if it is a known one.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" | "prettyjson" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(format!(
                "unknown format '{}' (expected csv, json or pretty-json)",
                other
            ))),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Coefficients of one window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoefficientRow {
    /// Reference date of the window.
    pub date: NaiveDate,

    /// Raw coefficients, in factor order.
    pub raw: Vec<f64>,

    /// Normalized coefficients, in factor order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<Vec<f64>>,
}

/// Flat, date-ordered view of a coefficient trajectory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoefficientExport {
    /// Name of the dependent series.
    pub dependent: String,

    /// Factor names, in column order.
    pub factors: Vec<String>,

    /// Window length in rows.
    pub window: usize,

    /// One row per window, ascending by date.
    pub rows: Vec<CoefficientRow>,
}

impl CoefficientExport {
    /// Export raw coefficients only.
    pub fn from_raw(dependent: impl Into<String>, trajectory: &CoefficientTrajectory) -> Self {
        Self::build(dependent.into(), trajectory, None)
    }

    /// Export raw and normalized coefficients.
    pub fn from_normalized(dependent: impl Into<String>, trajectory: &NormalizedTrajectory) -> Self {
        Self::build(
            dependent.into(),
            trajectory.raw(),
            Some(trajectory.normalized()),
        )
    }

    fn build(
        dependent: String,
        trajectory: &CoefficientTrajectory,
        normalized: Option<ArrayView2<'_, f64>>,
    ) -> Self {
        let rows = trajectory
            .iter()
            .enumerate()
            .map(|(i, window)| CoefficientRow {
                date: window.date,
                raw: window.coefficients,
                normalized: normalized.map(|n| n.row(i).to_vec()),
            })
            .collect();

        Self {
            dependent,
            factors: trajectory.factor_names().to_vec(),
            window: trajectory.window(),
            rows,
        }
    }

    /// Whether the normalized columns are present.
    pub fn has_normalized(&self) -> bool {
        self.rows.first().is_some_and(|row| row.normalized.is_some())
    }

    /// CSV header: `date`, raw columns, then normalized columns.
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(1 + 2 * self.factors.len());
        header.push("date".to_string());
        header.extend(self.factors.iter().map(|f| format!("coef_{}", f)));
        if self.has_normalized() {
            header.extend(self.factors.iter().map(|f| format!("coef_{}_norm", f)));
        }
        header
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn to_csv(&self) -> Result<String, ExportError> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(self.header())?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(1 + 2 * self.factors.len());
            record.push(row.date.format("%Y-%m-%d").to_string());
            record.extend(row.raw.iter().map(f64::to_string));
            if let Some(normalized) = &row.normalized {
                record.extend(normalized.iter().map(f64::to_string));
            }
            wtr.write_record(&record)?;
        }

        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl Exporter for CoefficientExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => self.to_csv(),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hobart_regression::{CoefficientNormalizer, RollingConfig, rolling_ols};
    use ndarray::array;
    use rstest::rstest;

    fn trajectory() -> CoefficientTrajectory {
        let x = array![
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [2.0, -1.0],
            [1.0, 3.0]
        ];
        let y = array![2.0, -1.0, 1.0, 5.0, -1.0];
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..5).map(|i| start + Duration::days(i)).collect();
        let names = vec!["oil".to_string(), "rates".to_string()];
        rolling_ols(
            &dates,
            &names,
            x.view(),
            y.view(),
            &RollingConfig {
                window: 3,
                parallel: false,
                rcond: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_raw_csv_header_and_rows() {
        let export = CoefficientExport::from_raw("nq", &trajectory());
        let csv = export.export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "date,coef_oil,coef_rates");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("2024-01-03,"));
        assert!(lines[3].starts_with("2024-01-05,"));
    }

    #[test]
    fn test_normalized_columns_follow_raw() {
        let normalized = CoefficientNormalizer::new().normalize(trajectory()).unwrap();
        let export = CoefficientExport::from_normalized("nq", &normalized);

        assert!(export.has_normalized());
        assert_eq!(
            export.header(),
            vec![
                "date",
                "coef_oil",
                "coef_rates",
                "coef_oil_norm",
                "coef_rates_norm"
            ]
        );

        let csv = export.export_to_string(ExportFormat::Csv).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        for record in reader.records() {
            let record = record.unwrap();
            assert_eq!(record.len(), 5);
            let norm: f64 = record[3].parse().unwrap();
            assert!(norm.abs() <= 1.0);
        }
    }

    #[test]
    fn test_json_round_trip() {
        let export = CoefficientExport::from_raw("nq", &trajectory());
        let json = export.export_to_string(ExportFormat::Json).unwrap();
        assert!(!json.contains("normalized"));

        let parsed: CoefficientExport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.dependent, "nq");
        assert_eq!(parsed.factors, export.factors);
        assert_eq!(parsed.window, 3);
        assert_eq!(parsed.len(), export.len());
        for (a, b) in parsed.rows.iter().zip(&export.rows) {
            assert_eq!(a.date, b.date);
            for (x, y) in a.raw.iter().zip(&b.raw) {
                assert!((x - y).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_pretty_json_is_indented() {
        let export = CoefficientExport::from_raw("nq", &trajectory());
        let json = export.export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(json.contains("\n  \"dependent\": \"nq\""));
    }

    #[rstest]
    #[case("csv", ExportFormat::Csv)]
    #[case("JSON", ExportFormat::Json)]
    #[case("pretty-json", ExportFormat::PrettyJson)]
    #[case("pretty_json", ExportFormat::PrettyJson)]
    fn test_format_parsing(#[case] input: &str, #[case] expected: ExportFormat) {
        assert_eq!(input.parse::<ExportFormat>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(matches!(
            "xlsx".parse::<ExportFormat>(),
            Err(ExportError::InvalidFormat(_))
        ));
    }

    #[rstest]
    #[case("out/coefficients.CSV", Some(ExportFormat::Csv))]
    #[case("out/coefficients.json", Some(ExportFormat::Json))]
    #[case("out/coefficients.txt", None)]
    #[case("out/coefficients", None)]
    fn test_format_from_path(#[case] path: &str, #[case] expected: Option<ExportFormat>) {
        assert_eq!(ExportFormat::from_path(Path::new(path)), expected);
    }

    #[test]
    fn test_extensions() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }
}
