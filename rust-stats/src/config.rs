//! Run configuration with defaults matching the 2011-2019 analysis

use std::path::PathBuf;

use crate::error::{validate_year_range, ConfigError};

/// Seasons and thresholds for one run
#[derive(Debug, Clone)]
pub struct SeasonConfig {
    /// First season scraped (inclusive)
    pub start_year: u16,
    /// Last season scraped (inclusive)
    pub end_year: u16,
    /// Seasons from this year on use the interactive playoff table
    pub playoff_layout_year: u16,
    /// Seasons from this year on form the evaluation set
    pub split_year: u16,
    /// Ranking keys excluded from the season table
    pub excluded_designations: Vec<String>,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            start_year: 2011,
            end_year: 2019,
            playoff_layout_year: 2017,
            split_year: 2017,
            excluded_designations: vec!["Reclassifying".to_string()],
        }
    }
}

impl SeasonConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_year_range(self.start_year, self.end_year)
    }

    pub fn years(&self) -> impl Iterator<Item = u16> {
        self.start_year..=self.end_year
    }
}

/// Browser session and HTTP settings
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// WebDriver endpoint (chromedriver, geckodriver)
    pub webdriver_url: String,
    /// Run the browser headless
    pub headless: bool,
    /// Upper bound for a single page interaction
    pub step_timeout_secs: u64,
    /// Pause after a selection so the page can re-render
    pub settle_ms: u64,
    /// Delay between archive requests in milliseconds
    pub delay_ms: u64,
    /// Total attempts per (category, year) unit, the first one included
    pub max_attempts: u32,
    /// User agent string for archive requests
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            step_timeout_secs: 30,
            settle_ms: 1500,
            delay_ms: 1000,
            max_attempts: 3,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// Output locations
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub cache_path: PathBuf,
    pub plots_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("data/teams.csv"),
            plots_dir: PathBuf::from("plots"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SeasonConfig::default();
        assert_eq!(config.start_year, 2011);
        assert_eq!(config.end_year, 2019);
        assert_eq!(config.playoff_layout_year, 2017);
        assert_eq!(config.years().count(), 9);
        assert!(config.validate().is_ok());

        let scraper = ScraperConfig::default();
        assert_eq!(scraper.max_attempts, 3);
        assert_eq!(scraper.step_timeout_secs, 30);
    }

    #[test]
    fn test_config_invalid_range() {
        let config = SeasonConfig {
            start_year: 2020,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
