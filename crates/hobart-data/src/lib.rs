#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod file;
pub mod fred;
pub mod series;
pub mod spec;
pub mod yahoo;

pub use cache::{CacheStats, SeriesCache};
pub use error::{DataError, Result};
pub use fetcher::{FetchConfig, SeriesFetcher};
pub use file::CsvSeriesLoader;
pub use fred::FredProvider;
pub use series::TimeSeries;
pub use spec::{SeriesSource, SeriesSpec};
pub use yahoo::YahooQuoteProvider;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
