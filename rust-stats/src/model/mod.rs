//! Win predictor, train/evaluation split, OLS fit and evaluation

pub mod analysis;
pub mod metrics;
pub mod ols;
pub mod predictor;
pub mod split;

pub use analysis::{predict_seasons, run_analysis, AnalysisOptions, RateRegressor, WinAnalysis};
pub use metrics::{
    analyze_by_conference, analyze_by_playoffs, calculate_metrics, r2_score, DimensionAnalysis,
    EvaluationMetrics,
};
pub use ols::{Coefficient, FitSummary, OlsModel};
pub use predictor::{expected_win_pct, WinPredictor, DEFAULT_BASE_RATE, DEFAULT_EXPONENT, DEFAULT_WEIGHT};
pub use split::{split_by_year, SeasonSplit};
