#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chart;
pub mod export;
pub mod summary;

pub use chart::{ChartExport, ChartPath, ChartSeries};
pub use export::{CoefficientExport, CoefficientRow, ExportError, ExportFormat, Exporter};
pub use summary::{FactorSummary, TrajectorySummary};
