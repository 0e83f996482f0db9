//! SQLite cache for fetched series.
//!
//! Observations are keyed by `(source, code, date)`. Missing observations are
//! stored as NULL so a cached series reproduces exactly what the provider
//! reported.

use crate::error::{DataError, Result};
use crate::series::TimeSeries;
use crate::spec::SeriesSource;
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

/// Minimum share of calendar days a cached range must cover to count as a hit.
///
/// Daily market series cover roughly 252 of 365 days, so 60% leaves room for
/// holidays without accepting a half-filled range.
const MIN_COVERAGE: f64 = 0.6;

/// Days a cached range may start after, or end before, the requested range.
///
/// Covers a weekend plus a holiday at either edge of a daily market series.
const EDGE_TOLERANCE_DAYS: i64 = 4;

/// SQLite cache for time series.
#[derive(Debug)]
pub struct SeriesCache {
    conn: Connection,
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of distinct cached series.
    pub series_count: usize,
    /// Total number of cached observations.
    pub observation_count: usize,
    /// Earliest cached date.
    pub earliest: Option<NaiveDate>,
    /// Latest cached date.
    pub latest: Option<NaiveDate>,
}

impl SeriesCache {
    /// Create a new SQLite cache.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS observations (
                source TEXT NOT NULL,
                code TEXT NOT NULL,
                date TEXT NOT NULL,
                value REAL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (source, code, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_observations_series_date
             ON observations(source, code, date)",
            [],
        )?;

        Ok(())
    }

    /// Check whether the cache covers `start..=end` for a series.
    pub fn has_series(
        &self,
        source: SeriesSource,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool> {
        if start > end {
            return Ok(false);
        }

        let row: Option<(i64, Option<String>, Option<String>)> = self
            .conn
            .query_row(
                "SELECT COUNT(*), MIN(date), MAX(date) FROM observations
                 WHERE source = ?1 AND code = ?2 AND date >= ?3 AND date <= ?4",
                params![source.as_str(), code, start.to_string(), end.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((count, Some(earliest), Some(latest))) = row else {
            return Ok(false);
        };

        let tolerance = chrono::Duration::days(EDGE_TOLERANCE_DAYS);
        let earliest = parse_date(&earliest)?;
        if earliest > start + tolerance {
            return Ok(false);
        }

        // A range ending today is covered once the latest stored date is recent.
        let latest = parse_date(&latest)?;
        if latest < end.min(Utc::now().date_naive()) - tolerance {
            return Ok(false);
        }

        let days = (end - start).num_days() + 1;
        let expected = (days as f64 * MIN_COVERAGE) as i64;
        Ok(count >= expected)
    }

    /// Get a cached series restricted to `start..=end`, named `name`.
    pub fn get_series(
        &self,
        source: SeriesSource,
        code: &str,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries> {
        let mut stmt = self.conn.prepare(
            "SELECT date, value FROM observations
             WHERE source = ?1 AND code = ?2 AND date >= ?3 AND date <= ?4
             ORDER BY date ASC",
        )?;

        let rows = stmt.query_map(
            params![source.as_str(), code, start.to_string(), end.to_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<f64>>(1)?)),
        )?;

        let mut dates = Vec::new();
        let mut values = Vec::new();
        for row in rows {
            let (date, value) = row?;
            dates.push(parse_date(&date)?);
            values.push(value.unwrap_or(f64::NAN));
        }

        if dates.is_empty() {
            return Err(DataError::MissingData {
                symbol: code.to_string(),
                reason: "Not in cache".to_string(),
            });
        }

        TimeSeries::new(name, dates, values)
    }

    /// Store a series, replacing any observations already cached for its dates.
    pub fn put_series(&self, source: SeriesSource, code: &str, series: &TimeSeries) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO observations (source, code, date, value, cached_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (date, value) in series.iter() {
                let value = value.is_finite().then_some(value);
                stmt.execute(params![
                    source.as_str(),
                    code,
                    date.to_string(),
                    value,
                    cached_at
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(%source, code, observations = series.len(), "series cached");
        Ok(())
    }

    /// Remove every cached observation of one series.
    pub fn clear_series(&self, source: SeriesSource, code: &str) -> Result<usize> {
        Ok(self.conn.execute(
            "DELETE FROM observations WHERE source = ?1 AND code = ?2",
            params![source.as_str(), code],
        )?)
    }

    /// Remove everything from the cache.
    pub fn clear_all(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM observations", [])?)
    }

    /// Summarize cache contents.
    pub fn stats(&self) -> Result<CacheStats> {
        let (series_count, observation_count, earliest, latest): (
            i64,
            i64,
            Option<String>,
            Option<String>,
        ) = self.conn.query_row(
            "SELECT COUNT(DISTINCT source || ':' || code), COUNT(*), MIN(date), MAX(date)
             FROM observations",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        Ok(CacheStats {
            series_count: series_count as usize,
            observation_count: observation_count as usize,
            earliest: earliest.as_deref().map(parse_date).transpose()?,
            latest: latest.as_deref().map(parse_date).transpose()?,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DataError::Parse(format!("Invalid cached date '{}': {}", s, e)))
}
