//! Resolve series descriptors into series.
//!
//! The fetcher dispatches each [`SeriesSpec`] to its provider, reading from and
//! writing to the [`SeriesCache`] when caching is enabled. Several specs are
//! fetched concurrently and returned in the order they were given.

use crate::cache::SeriesCache;
use crate::error::{DataError, Result};
use crate::file::CsvSeriesLoader;
use crate::fred::FredProvider;
use crate::series::TimeSeries;
use crate::spec::{SeriesSource, SeriesSpec};
use crate::yahoo::YahooQuoteProvider;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Mutex;

/// Default number of concurrent fetches.
const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration for data fetching.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whether to use the cache.
    pub use_cache: bool,
    /// Whether to force refresh (ignore cached data, then overwrite it).
    pub force_refresh: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
        }
    }
}

/// Fetches series from every supported source.
#[derive(Debug)]
pub struct SeriesFetcher {
    yahoo: YahooQuoteProvider,
    fred: FredProvider,
    files: CsvSeriesLoader,
    cache: Option<Mutex<SeriesCache>>,
    config: FetchConfig,
    concurrency: usize,
}

impl SeriesFetcher {
    /// Create a fetcher without a cache.
    pub fn new() -> Result<Self> {
        Ok(Self {
            yahoo: YahooQuoteProvider::new()?,
            fred: FredProvider::new()?,
            files: CsvSeriesLoader::new(),
            cache: None,
            config: FetchConfig {
                use_cache: false,
                force_refresh: false,
            },
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    /// Attach a cache and the policy for using it.
    pub fn with_cache(mut self, cache: SeriesCache, config: FetchConfig) -> Self {
        self.cache = config.use_cache.then(|| Mutex::new(cache));
        self.config = config;
        self
    }

    /// Set the number of series fetched at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch one series, named after the spec's alias.
    pub async fn fetch(
        &self,
        spec: &SeriesSpec,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        if spec.source.is_cacheable() && !self.config.force_refresh {
            if let Some(series) = self.cached(spec, start, end) {
                tracing::info!(series = %spec, observations = series.len(), "cache hit");
                return Ok(series);
            }
        }

        let series = match spec.source {
            SeriesSource::Yahoo => self.yahoo.fetch_close_series(&spec.code, start, end).await?,
            SeriesSource::Fred => self.fred.fetch_series(&spec.code, start, end).await?,
            SeriesSource::File => self.files.load(&spec.code, &spec.alias)?.between(start, end),
        };

        if spec.source.is_cacheable() {
            self.store(spec, &series);
        }

        Ok(series.with_name(spec.alias.clone()))
    }

    /// Fetch several series concurrently, preserving the order of `specs`.
    ///
    /// Fails on the first series that cannot be fetched.
    pub async fn fetch_all(
        &self,
        specs: &[SeriesSpec],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimeSeries>> {
        stream::iter(specs)
            .map(|spec| self.fetch(spec, start, end))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    fn cached(&self, spec: &SeriesSpec, start: NaiveDate, end: NaiveDate) -> Option<TimeSeries> {
        let cache = self.cache.as_ref()?.lock().ok()?;
        match cache.has_series(spec.source, &spec.code, start, end) {
            Ok(true) => cache
                .get_series(spec.source, &spec.code, &spec.alias, start, end)
                .map_err(|e| tracing::warn!(series = %spec, error = %e, "cache read failed"))
                .ok(),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!(series = %spec, error = %e, "cache lookup failed");
                None
            }
        }
    }

    fn store(&self, spec: &SeriesSpec, series: &TimeSeries) {
        let Some(cache) = &self.cache else {
            return;
        };
        let result = cache
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))
            .and_then(|cache| cache.put_series(spec.source, &spec.code, series));
        if let Err(e) = result {
            tracing::warn!(series = %spec, error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_all_from_files_preserves_order() {
        let dir = std::env::temp_dir();
        let a = dir.join("hobart_fetcher_a.csv");
        let b = dir.join("hobart_fetcher_b.csv");
        std::fs::write(&a, "date,v\n2024-01-02,1\n2024-01-03,2\n2024-02-01,3\n").unwrap();
        std::fs::write(&b, "date,v\n2024-01-02,5\n2024-01-03,6\n").unwrap();

        let specs: Vec<SeriesSpec> = vec![
            format!("alpha=file:{}", a.display()).parse().unwrap(),
            format!("file:{}", b.display()).parse().unwrap(),
        ];

        let fetcher = SeriesFetcher::new().unwrap();
        let series = fetcher
            .fetch_all(&specs, date(2024, 1, 1), date(2024, 1, 31))
            .await
            .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name(), "alpha");
        assert_eq!(series[0].values(), &[1.0, 2.0]);
        assert_eq!(series[1].name(), "hobart_fetcher_b");

        std::fs::remove_file(a).ok();
        std::fs::remove_file(b).ok();
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let cache = SeriesCache::in_memory().unwrap();
        let start = date(2020, 1, 1);
        let series = TimeSeries::from_points(
            "T10YIE",
            (0..31).map(|i| (start + chrono::Duration::days(i), 1.5)),
        )
        .unwrap();
        cache.put_series(SeriesSource::Fred, "T10YIE", &series).unwrap();

        let fetcher = SeriesFetcher::new()
            .unwrap()
            .with_cache(cache, FetchConfig::default());
        let spec: SeriesSpec = "breakeven=fred:T10YIE".parse().unwrap();

        // No network in tests: a hit is the only way this can succeed.
        let fetched = fetcher.fetch(&spec, start, date(2020, 1, 31)).await.unwrap();
        assert_eq!(fetched.name(), "breakeven");
        assert_eq!(fetched.len(), 31);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let fetcher = SeriesFetcher::new().unwrap();
        let spec: SeriesSpec = "file:/nonexistent/hobart.csv".parse().unwrap();
        let result = fetcher.fetch(&spec, date(2024, 1, 1), date(2024, 2, 1)).await;
        assert!(matches!(result, Err(DataError::Io(_))));
    }
}
