//! Caching layer for fetched series.

pub mod sqlite;

pub use sqlite::{CacheStats, SeriesCache};
