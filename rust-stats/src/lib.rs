//! Lacrosse Moneyball - NCAA Division I men's lacrosse season analysis
//!
//! This library provides:
//! - Stat-table scraping of the national ranking page over WebDriver
//! - Playoff-field resolution from the championship archive and the
//!   postseason rankings
//! - Season-table aggregation and a CSV cache
//! - Win predictors (linear and Pythagorean), OLS fit and evaluation metrics
//! - Plotly figures of projected vs. actual wins
//!
//! # Example
//!
//! ```no_run
//! use lacrosse::data::load_records;
//! use lacrosse::model::{run_analysis, AnalysisOptions};
//!
//! let records = load_records("data/teams.csv").unwrap();
//! let analysis = run_analysis(&records, &AnalysisOptions::default()).unwrap();
//! println!("Evaluation R²: {:.3}", analysis.metrics.r2);
//! ```

pub mod collect;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod models;
pub mod names;
pub mod report;
pub mod scraper;

// Re-export commonly used types
pub use collect::{CollectedSeasons, Collector, FailureSummary};
pub use config::{OutputConfig, ScraperConfig, SeasonConfig};
pub use data::{load_records, save_records, SeasonAggregator};
pub use model::{run_analysis, AnalysisOptions, OlsModel, WinAnalysis, WinPredictor};
pub use models::{
    PlayoffSet, RawStatRow, RawStatTable, ScoredSeason, SeasonRecord, StatCategory,
    TeamPrediction,
};
pub use names::AliasTable;
