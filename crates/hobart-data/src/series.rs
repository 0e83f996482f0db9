//! Daily time series.
//!
//! A [`TimeSeries`] is the unit every provider produces and every downstream
//! stage consumes. Dates are strictly increasing and never repeat. A value may
//! be missing (stored as NaN) when the provider reported the date without an
//! observation, e.g. FRED's `.` placeholder on holidays.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// An immutable, date-ordered sequence of daily observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series from parallel date and value vectors.
    ///
    /// # Errors
    /// Returns [`DataError::LengthMismatch`] if the vectors differ in length and
    /// [`DataError::UnorderedDates`] if the dates are not strictly increasing.
    pub fn new(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();

        if dates.len() != values.len() {
            return Err(DataError::LengthMismatch {
                series: name,
                dates: dates.len(),
                values: values.len(),
            });
        }

        if let Some(pair) = dates.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(DataError::UnorderedDates {
                series: name,
                date: pair[1],
            });
        }

        Ok(Self {
            name,
            dates,
            values,
        })
    }

    /// Create a series from `(date, value)` pairs already in ascending order.
    pub fn from_points<I>(name: impl Into<String>, points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let (dates, values) = points.into_iter().unzip();
        Self::new(name, dates, values)
    }

    /// Create a series from pairs in any order.
    ///
    /// Points are sorted by date; when a date repeats, the last value wins.
    pub fn from_unsorted<I>(name: impl Into<String>, points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let by_date: BTreeMap<NaiveDate, f64> = points.into_iter().collect();
        let (dates, values) = by_date.into_iter().unzip();
        Self {
            name: name.into(),
            dates,
            values,
        }
    }

    /// Series name (symbol, series code or alias).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the same observations under a different name.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    /// Observation dates in ascending order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Observation values, aligned with [`dates`](Self::dates).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations, missing ones included.
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series has no observations.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First observation date.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Last observation date.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Value on `date`, if the date is in the index.
    ///
    /// A missing observation is returned as `Some(NaN)`.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// Iterate over `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Number of dates whose value is missing or non-finite.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_finite()).count()
    }

    /// Observations with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end).max(lo);
        Self {
            name: self.name.clone(),
            dates: self.dates[lo..hi].to_vec(),
            values: self.values[lo..hi].to_vec(),
        }
    }
}
