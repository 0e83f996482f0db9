//! Daily close series from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::series::TimeSeries;
use chrono::{DateTime, NaiveDate, Utc};
use std::time::Duration;
use tokio::time::sleep;
use yahoo_finance_api as yahoo;

/// Yahoo Finance quote provider with rate limiting.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a new Yahoo Finance quote provider with default rate limiting (1 req/sec).
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a new Yahoo Finance quote provider with custom rate limiting.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
        })
    }

    /// Fetch the daily close series for a symbol.
    ///
    /// # Arguments
    /// * `symbol` - The ticker symbol (e.g., "NQ=F")
    /// * `start` - First date to include
    /// * `end` - Last date to include
    ///
    /// Yahoo occasionally reports the current session twice; the later quote
    /// wins for any repeated date.
    pub async fn fetch_close_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let start_time = to_offset_date_time(start)?;
        // Yahoo's end bound is exclusive.
        let end_time = to_offset_date_time(end + chrono::Duration::days(1))?;

        tracing::info!(symbol, %start, %end, "fetching Yahoo Finance quotes");
        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        let mut points = Vec::with_capacity(quotes.len());
        for quote in &quotes {
            let timestamp = i64::try_from(quote.timestamp)
                .map_err(|e| DataError::TimeConversion(e.to_string()))?;
            let date = DateTime::<Utc>::from_timestamp(timestamp, 0)
                .ok_or_else(|| {
                    DataError::TimeConversion(format!("timestamp {} out of range", timestamp))
                })?
                .date_naive();
            if (start..=end).contains(&date) {
                points.push((date, quote.close));
            }
        }

        let series = TimeSeries::from_unsorted(symbol, points);
        tracing::debug!(symbol, observations = series.len(), "Yahoo Finance quotes parsed");

        sleep(self.rate_limit_delay).await;

        Ok(series)
    }
}

fn to_offset_date_time(date: NaiveDate) -> Result<time::OffsetDateTime> {
    let timestamp = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DataError::TimeConversion(format!("invalid date {}", date)))?
        .and_utc()
        .timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}
