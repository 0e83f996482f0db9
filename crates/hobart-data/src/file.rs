//! Local CSV series files.
//!
//! Files hold one observation per row: a `YYYY-MM-DD` date in the first
//! column and the value in the second. A header row is required. Empty cells,
//! `.` (FRED's placeholder) and `NaN` are read as missing observations.

use crate::error::{DataError, Result};
use crate::series::TimeSeries;
use chrono::NaiveDate;
use std::io::Read;
use std::path::Path;

/// Loader for `date,value` CSV files.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSeriesLoader;

impl CsvSeriesLoader {
    /// Create a new loader.
    pub const fn new() -> Self {
        Self
    }

    /// Load the series stored at `path` under `name`.
    pub fn load<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<TimeSeries> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), name, "loading series file");
        let file = std::fs::File::open(path)?;
        read_date_value_csv(name, file)
    }
}

/// Parse `date,value` rows from any reader into a series.
///
/// Rows may arrive in any order; a repeated date keeps its last value.
pub(crate) fn read_date_value_csv<R: Read>(name: &str, reader: R) -> Result<TimeSeries> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut points = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let (Some(date), Some(value)) = (record.get(0), record.get(1)) else {
            return Err(DataError::Parse(format!(
                "{}: row {} needs a date and a value",
                name,
                line + 2
            )));
        };
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| DataError::Parse(format!("{}: bad date '{}': {}", name, date, e)))?;
        points.push((date, parse_value(name, value)?));
    }

    Ok(TimeSeries::from_unsorted(name, points))
}

fn parse_value(name: &str, raw: &str) -> Result<f64> {
    match raw {
        "" | "." | "NaN" | "nan" | "NA" => Ok(f64::NAN),
        _ => raw
            .parse::<f64>()
            .map_err(|e| DataError::Parse(format!("{}: bad value '{}': {}", name, raw, e))),
    }
}
