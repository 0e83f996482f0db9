//! Analysis configuration.

use hobart_regression::RollingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating an [`AnalysisConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for [`AnalysisConfig`].
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// A parameter is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration of one attribution run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rolling window length in rows (default: 60 trading days)
    pub window: usize,

    /// Fit windows in parallel (default: true)
    pub parallel: bool,

    /// Compute and export max-abs normalized coefficients (default: true)
    pub include_normalized: bool,

    /// Relative singular value cutoff for the minimum-norm solve
    /// (default: `max(W, K) * f64::EPSILON`)
    pub rcond: Option<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: 60,
            parallel: true,
            include_normalized: true,
            rcond: None,
        }
    }
}

impl AnalysisConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::Invalid(
                "window must be at least one row".to_string(),
            ));
        }
        if let Some(rcond) = self.rcond.filter(|r| !r.is_finite() || *r < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "rcond must be finite and non-negative, got {}",
                rcond
            )));
        }
        Ok(())
    }

    /// Regression settings for [`hobart_regression::RollingRegressor`].
    pub const fn rolling_config(&self) -> RollingConfig {
        RollingConfig {
            window: self.window,
            parallel: self.parallel,
            rcond: self.rcond,
        }
    }
}
