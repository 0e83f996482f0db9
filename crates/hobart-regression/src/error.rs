//! Errors raised by the regression stages.

use thiserror::Error;

/// Errors that can occur while aligning, standardizing, regressing or
/// normalizing.
///
/// All of them mean the input is unsuitable for the requested analysis;
/// none is transient.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegressionError {
    /// The input series share no date on which every series has a value
    #[error("Empty alignment: the series have no common date with a value in every series")]
    EmptyAlignment,

    /// A column has zero variance and cannot be standardized
    #[error("Degenerate column '{column}': standard deviation is zero")]
    DegenerateColumn {
        /// Column name
        column: String,
    },

    /// Window shorter than the number of parameters
    #[error("Window too small: {window} rows, need at least {required}")]
    WindowTooSmall {
        /// Requested window length
        window: usize,
        /// Factors plus one
        required: usize,
    },

    /// A factor's coefficient is zero in every window
    #[error("Degenerate factor '{factor}': coefficient is zero in every window")]
    DegenerateFactor {
        /// Factor name
        factor: String,
    },

    /// No explanatory series were given
    #[error("At least one factor series is required")]
    NoFactors,

    /// Two columns share a name
    #[error("Duplicate column name '{column}'")]
    DuplicateColumn {
        /// Repeated name
        column: String,
    },

    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData {
        /// Required number of rows
        required: usize,
        /// Actual number of rows
        actual: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Table that violates the aligned-table invariants
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
