//! Error taxonomy for the scrape, aggregate and fit stages

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure while driving the interactive ranking page.
///
/// Scoped to one (category, year) unit; the collector records it and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Browser session error: {0}")]
    Session(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Option {wanted:?} not present in {control} selector")]
    OptionMissing {
        control: &'static str,
        wanted: String,
    },

    #[error("Driver command failed during {step}: {message}")]
    Driver { step: String, message: String },

    #[error("Timed out after {timeout:?} during {step}")]
    Timeout { step: String, timeout: Duration },

    #[error("Failed to parse HTML: {0}")]
    ParseError(String),

    #[error("Column {0:?} missing from rankings table")]
    MissingColumn(String),
}

impl FetchError {
    /// A missing option or column will not appear on a second attempt
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            FetchError::OptionMissing { .. } | FetchError::MissingColumn(_)
        )
    }
}

/// Failure while resolving one season's postseason field.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[cfg(feature = "live")]
    #[error("Archive request for {year} failed: {source}")]
    Http {
        year: u16,
        #[source]
        source: reqwest::Error,
    },

    #[error("Archive request for {year} returned status {status}")]
    Status { year: u16, status: u16 },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No playoff teams found for {year}")]
    NoTeams { year: u16 },
}

/// Merged season table failed a quality check. Fatal for aggregation.
#[derive(Debug, Error)]
pub enum DataQualityError {
    #[error("Malformed {column} value {value:?} for {team} in {year}")]
    Malformed {
        team: String,
        year: u16,
        column: String,
        value: String,
    },

    #[error("Duplicate season row for {team} in {year}")]
    DuplicateTeam { team: String, year: u16 },

    #[error("No season rows left after cleaning")]
    Empty,
}

/// Degenerate regression input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelFitError {
    #[error("Need at least {needed} observations, got {actual}")]
    TooFewObservations { needed: usize, actual: usize },

    #[error("Regressor and response lengths differ: {x} vs {y}")]
    LengthMismatch { x: usize, y: usize },

    #[error("Regressor has zero variance")]
    ZeroVariance,

    #[error("Non-finite value at row {0}")]
    NonFinite(usize),
}

/// Season cache read/write failure.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache CSV error: {0}")]
    Csv(#[from] polars::prelude::PolarsError),

    #[error("Cache column {column} has no value in row {row}")]
    MissingValue { column: &'static str, row: usize },

    #[error("Cache columns {found:?} do not match the season table layout")]
    Schema { found: Vec<String> },

    #[error("Cache row {row} is inconsistent: {message}")]
    Inconsistent { row: usize, message: String },
}

/// Plot artifact write failure.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize figure: {0}")]
    Json(#[from] serde_json::Error),
}

/// Invalid run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Start year {start} is after end year {end}")]
    YearRange { start: u16, end: u16 },

    #[error("Alias cycle through {0:?}")]
    AliasCycle(String),

    #[error("Failed to read alias table {path:?}: {message}")]
    AliasFile { path: PathBuf, message: String },
}

/// Validate an inclusive season range
pub fn validate_year_range(start: u16, end: u16) -> Result<(), ConfigError> {
    if start > end {
        return Err(ConfigError::YearRange { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_year_range() {
        assert!(validate_year_range(2011, 2019).is_ok());
        assert!(validate_year_range(2017, 2017).is_ok());
        assert!(validate_year_range(2019, 2011).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = FetchError::OptionMissing {
            control: "academic year",
            wanted: "2012.0".to_string(),
        };
        assert!(err.to_string().contains("academic year"));
        assert!(err.to_string().contains("2012.0"));

        let err = ResolverError::from(FetchError::ElementNotFound("#rp".to_string()));
        assert!(err.to_string().contains("#rp"));

        let err = ResolverError::Status {
            year: 2012,
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "Archive request for 2012 returned status 503"
        );
    }
}
