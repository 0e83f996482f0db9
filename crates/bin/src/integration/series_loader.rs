//! Series fetching with progress reporting.

use crate::integration::cache_manager;
use chrono::NaiveDate;
use hobart_data::{DataError, FetchConfig, SeriesFetcher, SeriesSpec, TimeSeries};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Build a fetcher, attaching the on-disk cache unless caching is disabled.
pub(crate) fn build_fetcher(config: FetchConfig) -> Result<SeriesFetcher, DataError> {
    let fetcher = SeriesFetcher::new()?;
    if !config.use_cache {
        return Ok(fetcher);
    }
    Ok(fetcher.with_cache(cache_manager::open_cache()?, config))
}

/// Fetch `specs` concurrently behind a spinner.
pub(crate) async fn fetch_with_progress(
    fetcher: &SeriesFetcher,
    specs: &[SeriesSpec],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TimeSeries>, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Fetching {} series...", specs.len()));

    match fetcher.fetch_all(specs, start, end).await {
        Ok(series) => {
            let observations: usize = series.iter().map(TimeSeries::len).sum();
            pb.finish_with_message(format!(
                "Fetched {} series ({} observations)",
                series.len(),
                observations
            ));
            Ok(series)
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(format!("Failed to fetch series: {}", e).into())
        }
    }
}
