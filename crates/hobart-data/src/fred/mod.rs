//! FRED (Federal Reserve Economic Data) series.
//!
//! Series are downloaded through the public `fredgraph.csv` export, which
//! needs no API key. Observation dates without a value (`.`) are kept as
//! missing observations.

use crate::error::{DataError, Result};
use crate::file::read_date_value_csv;
use crate::series::TimeSeries;
use chrono::NaiveDate;
use std::time::Duration;

/// Default FRED graph export endpoint.
pub const DEFAULT_BASE_URL: &str = "https://fred.stlouisfed.org/graph/fredgraph.csv";

/// FRED series provider.
#[derive(Debug, Clone)]
pub struct FredProvider {
    client: reqwest::Client,
    base_url: String,
}

impl FredProvider {
    /// Create a provider against the public FRED endpoint.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a provider against a custom endpoint (mirrors, test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hobart/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Fetch series `code` (e.g. `T10YIE`) between `start` and `end` inclusive.
    pub async fn fetch_series(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        if code.is_empty() {
            return Err(DataError::InvalidSymbol("Empty series code".to_string()));
        }

        tracing::info!(code, %start, %end, "fetching FRED series");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("id", code.to_string()),
                ("cosd", start.to_string()),
                ("coed", end.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http(format!(
                "FRED returned {} for series {}",
                status, code
            )));
        }

        let body = response.text().await?;
        let series = parse_fredgraph_csv(code, &body)?.between(start, end);

        if series.is_empty() {
            return Err(DataError::MissingData {
                symbol: code.to_string(),
                reason: "No observations returned from FRED".to_string(),
            });
        }

        tracing::debug!(
            code,
            observations = series.len(),
            missing = series.missing_count(),
            "FRED series parsed"
        );
        Ok(series)
    }
}

/// Parse a `fredgraph.csv` body.
///
/// FRED answers unknown series with an HTML page rather than an error status,
/// so a body that does not start with a CSV header is rejected.
fn parse_fredgraph_csv(code: &str, body: &str) -> Result<TimeSeries> {
    let header = body.lines().next().unwrap_or_default();
    if !header.contains(',') || header.trim_start().starts_with('<') {
        return Err(DataError::Fred(format!(
            "unexpected response for series {}",
            code
        )));
    }
    read_date_value_csv(code, body.as_bytes())
}
