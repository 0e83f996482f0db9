//! Series descriptors.
//!
//! A descriptor has the form `[alias=]source:code`:
//!
//! - `yahoo:NQ=F` is the Nasdaq-100 futures close, named `NQ=F`
//! - `nq=yahoo:NQ=F` is the same series, named `nq`
//! - `fred:T10YIE` is the 10-year breakeven inflation rate from FRED
//! - `oil=file:data/wti.csv` is a local `date,value` file
//!
//! The alias becomes the column name downstream (`coef_<alias>` in exports).

use crate::error::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Where a series comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesSource {
    /// Yahoo Finance daily close.
    Yahoo,
    /// FRED economic data.
    Fred,
    /// Local CSV file.
    File,
}

impl SeriesSource {
    /// Identifier used in descriptors and cache keys.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::Fred => "fred",
            Self::File => "file",
        }
    }

    /// Whether series from this source are stored in the cache.
    ///
    /// Local files are always read fresh.
    pub const fn is_cacheable(&self) -> bool {
        !matches!(self, Self::File)
    }
}

impl fmt::Display for SeriesSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesSource {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "fred" => Ok(Self::Fred),
            "file" | "csv" => Ok(Self::File),
            other => Err(DataError::InvalidSpec {
                spec: s.to_string(),
                reason: format!("unknown source '{}' (expected yahoo, fred or file)", other),
            }),
        }
    }
}

/// A parsed `[alias=]source:code` descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesSpec {
    /// Name used for the series downstream.
    pub alias: String,
    /// Provider.
    pub source: SeriesSource,
    /// Provider-specific identifier: ticker, series code or file path.
    pub code: String,
}

impl SeriesSpec {
    /// Create a spec whose alias defaults from the code.
    pub fn new(source: SeriesSource, code: impl Into<String>) -> Self {
        let code = code.into();
        let alias = default_alias(source, &code);
        Self {
            alias,
            source,
            code,
        }
    }

    /// Replace the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }
}

fn default_alias(source: SeriesSource, code: &str) -> String {
    match source {
        SeriesSource::File => Path::new(code)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(code)
            .to_string(),
        SeriesSource::Yahoo | SeriesSource::Fred => code.to_string(),
    }
}

impl FromStr for SeriesSpec {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| DataError::InvalidSpec {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        // Tickers such as `NQ=F` contain '=', so only a prefix without ':' is an alias.
        let (alias, rest) = match s.split_once('=') {
            Some((alias, rest)) if !alias.contains(':') => (Some(alias.trim()), rest),
            _ => (None, s),
        };

        let (source, code) = rest
            .split_once(':')
            .ok_or_else(|| invalid("expected source:code"))?;
        let source: SeriesSource = source.trim().parse()?;
        let code = code.trim();

        if code.is_empty() {
            return Err(invalid("empty code"));
        }

        let spec = Self::new(source, code);
        match alias {
            Some("") => Err(invalid("empty alias")),
            Some(alias) => Ok(spec.with_alias(alias)),
            None => Ok(spec),
        }
    }
}

impl fmt::Display for SeriesSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}:{}", self.alias, self.source, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("yahoo:NQ=F", "NQ=F", SeriesSource::Yahoo, "NQ=F")]
    #[case("nq=yahoo:NQ=F", "nq", SeriesSource::Yahoo, "NQ=F")]
    #[case("fred:T10YIE", "T10YIE", SeriesSource::Fred, "T10YIE")]
    #[case("breakeven = FRED:T10YIE", "breakeven", SeriesSource::Fred, "T10YIE")]
    #[case("file:data/wti.csv", "wti", SeriesSource::File, "data/wti.csv")]
    fn test_parse(
        #[case] input: &str,
        #[case] alias: &str,
        #[case] source: SeriesSource,
        #[case] code: &str,
    ) {
        let spec: SeriesSpec = input.parse().unwrap();
        assert_eq!(spec.alias, alias);
        assert_eq!(spec.source, source);
        assert_eq!(spec.code, code);
    }

    #[rstest]
    #[case("T10YIE")]
    #[case("bloomberg:SPX")]
    #[case("fred:")]
    #[case("=fred:T10YIE")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(matches!(
            input.parse::<SeriesSpec>(),
            Err(DataError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_display_round_trips() {
        let spec: SeriesSpec = "nq=yahoo:NQ=F".parse().unwrap();
        assert_eq!(spec.to_string(), "nq=yahoo:NQ=F");
        assert_eq!(spec.to_string().parse::<SeriesSpec>().unwrap(), spec);
    }
}
