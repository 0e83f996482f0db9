#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod align;
pub mod error;
pub mod linalg;
pub mod normalize;
pub mod rolling;
pub mod standardize;
pub mod trajectory;

// Re-export main types
pub use align::{AlignedTable, SeriesAligner};
pub use error::RegressionError;
pub use linalg::{LeastSquares, lstsq};
pub use normalize::{CoefficientNormalizer, NormalizedTrajectory};
pub use rolling::{RollingConfig, RollingRegressor, rolling_ols};
pub use standardize::{ColumnStats, StandardizedTable, Standardizer};
pub use trajectory::{CoefficientTrajectory, WindowCoefficients};
