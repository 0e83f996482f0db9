//! Stage wiring for a complete attribution run.
//!
//! The stages run strictly in order: align, standardize, regress, normalize.
//! Each consumes the previous stage's output in full and the first failure
//! aborts the run.

use crate::config::{AnalysisConfig, ConfigError};
use hobart_data::TimeSeries;
use hobart_output::{
    ChartExport, CoefficientExport, ExportError, ExportFormat, Exporter, TrajectorySummary,
};
use hobart_regression::{
    AlignedTable, CoefficientNormalizer, CoefficientTrajectory, NormalizedTrajectory,
    RegressionError, RollingRegressor, SeriesAligner, StandardizedTable, Standardizer,
};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// A stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Date intersection of the input series.
    Align,
    /// Global z-scoring.
    Standardize,
    /// Rolling least squares.
    Regress,
    /// Max-abs normalization of the coefficient paths.
    Normalize,
}

impl Stage {
    /// Lowercase stage name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Align => "align",
            Self::Standardize => "standardize",
            Self::Regress => "regress",
            Self::Normalize => "normalize",
        }
    }

    fn tag(self) -> impl FnOnce(RegressionError) -> PipelineError {
        move |source| PipelineError::Stage {
            stage: self,
            source,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from an attribution run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A regression stage rejected its input.
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// Stage that failed.
        stage: Stage,
        /// Underlying failure.
        source: RegressionError,
    },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Writing results failed.
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// Stage that failed, for stage errors.
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Underlying regression error, for stage errors.
    pub const fn regression_error(&self) -> Option<&RegressionError> {
        match self {
            Self::Stage { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Coefficients {
    Raw(CoefficientTrajectory),
    Normalized(NormalizedTrajectory),
}

/// Output of every stage of one run.
#[derive(Debug, Clone)]
pub struct AttributionResult {
    aligned: AlignedTable,
    standardized: StandardizedTable,
    coefficients: Coefficients,
}

impl AttributionResult {
    /// Aligned, unstandardized input table.
    pub const fn aligned(&self) -> &AlignedTable {
        &self.aligned
    }

    /// Standardized table the windows were cut from.
    pub const fn standardized(&self) -> &StandardizedTable {
        &self.standardized
    }

    /// Name of the dependent series.
    pub fn dependent_name(&self) -> &str {
        self.aligned.dependent_name()
    }

    /// Raw coefficient trajectory.
    pub const fn raw(&self) -> &CoefficientTrajectory {
        match &self.coefficients {
            Coefficients::Raw(trajectory) => trajectory,
            Coefficients::Normalized(normalized) => normalized.raw(),
        }
    }

    /// Normalized trajectory, when normalization ran.
    pub const fn normalized(&self) -> Option<&NormalizedTrajectory> {
        match &self.coefficients {
            Coefficients::Raw(_) => None,
            Coefficients::Normalized(normalized) => Some(normalized),
        }
    }

    /// Flat coefficient table.
    pub fn coefficient_export(&self) -> CoefficientExport {
        match &self.coefficients {
            Coefficients::Raw(trajectory) => {
                CoefficientExport::from_raw(self.dependent_name(), trajectory)
            }
            Coefficients::Normalized(normalized) => {
                CoefficientExport::from_normalized(self.dependent_name(), normalized)
            }
        }
    }

    /// Series and coefficient paths for plotting.
    pub fn chart_export(&self) -> ChartExport {
        match &self.coefficients {
            Coefficients::Raw(trajectory) => ChartExport::from_raw(&self.aligned, trajectory),
            Coefficients::Normalized(normalized) => {
                ChartExport::from_normalized(&self.aligned, normalized)
            }
        }
    }

    /// Per-factor summary.
    pub fn summary(&self) -> TrajectorySummary {
        match &self.coefficients {
            Coefficients::Raw(trajectory) => {
                TrajectorySummary::from_raw(self.dependent_name(), trajectory)
            }
            Coefficients::Normalized(normalized) => {
                TrajectorySummary::from_normalized(self.dependent_name(), normalized)
            }
        }
    }

    /// Write the coefficient table to `path`.
    pub fn write_coefficients(&self, path: &Path, format: ExportFormat) -> Result<(), PipelineError> {
        self.coefficient_export().export_to_file(path, format)?;
        tracing::info!(path = %path.display(), format = format.extension(), "coefficients written");
        Ok(())
    }

    /// Write chart data to `path` as JSON.
    pub fn write_chart(&self, path: &Path) -> Result<(), PipelineError> {
        self.chart_export()
            .export_to_file(path, ExportFormat::PrettyJson)?;
        tracing::info!(path = %path.display(), "chart data written");
        Ok(())
    }
}

/// Runs align, standardize, regress and normalize in sequence.
#[derive(Debug, Clone)]
pub struct AttributionPipeline {
    config: AnalysisConfig,
    regressor: RollingRegressor,
}

impl AttributionPipeline {
    /// Build a pipeline from a validated configuration.
    pub fn new(config: AnalysisConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let regressor =
            RollingRegressor::new(config.rolling_config()).map_err(Stage::Regress.tag())?;
        Ok(Self { config, regressor })
    }

    /// Get the configuration.
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every stage on `dependent` and `factors`.
    ///
    /// # Errors
    /// Returns [`PipelineError::Stage`] tagged with the first stage that fails.
    pub fn run(
        &self,
        dependent: &TimeSeries,
        factors: &[TimeSeries],
    ) -> Result<AttributionResult, PipelineError> {
        let aligned = SeriesAligner::new()
            .align(dependent, factors)
            .map_err(Stage::Align.tag())?;
        let standardized = Standardizer::new()
            .standardize(&aligned)
            .map_err(Stage::Standardize.tag())?;
        let trajectory = self
            .regressor
            .fit(&standardized)
            .map_err(Stage::Regress.tag())?;

        let coefficients = if self.config.include_normalized {
            Coefficients::Normalized(
                CoefficientNormalizer::new()
                    .normalize(trajectory)
                    .map_err(Stage::Normalize.tag())?,
            )
        } else {
            Coefficients::Raw(trajectory)
        };

        let result = AttributionResult {
            aligned,
            standardized,
            coefficients,
        };
        tracing::info!(
            dependent = result.dependent_name(),
            rows = result.aligned.n_rows(),
            factors = result.aligned.n_factors(),
            windows = result.raw().len(),
            "attribution complete"
        );
        Ok(result)
    }
}
