//! Predictor, split, fit and evaluation in one pass

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use super::metrics::{
    analyze_by_conference, analyze_by_playoffs, calculate_metrics, DimensionAnalysis,
    EvaluationMetrics,
};
use super::{split_by_year, OlsModel, SeasonSplit, WinPredictor};
use crate::config::SeasonConfig;
use crate::error::ModelFitError;
use crate::models::{ScoredSeason, SeasonRecord, TeamPrediction};

/// Knobs for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub predictor: WinPredictor,
    pub split_year: u16,
    pub with_intercept: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            predictor: WinPredictor::default(),
            split_year: SeasonConfig::default().split_year,
            with_intercept: true,
        }
    }
}

/// Scoring rate used as the regressor of a win-percentage model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateRegressor {
    Gpg,
    Gapg,
}

impl RateRegressor {
    pub const ALL: [RateRegressor; 2] = [RateRegressor::Gpg, RateRegressor::Gapg];

    pub fn value(self, season: &ScoredSeason) -> f64 {
        match self {
            RateRegressor::Gpg => season.record.gpg,
            RateRegressor::Gapg => season.record.gapg,
        }
    }

    /// Artifact name fragment
    pub fn slug(self) -> &'static str {
        match self {
            RateRegressor::Gpg => "gpg",
            RateRegressor::Gapg => "gapg",
        }
    }
}

impl fmt::Display for RateRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateRegressor::Gpg => write!(f, "GPG"),
            RateRegressor::Gapg => write!(f, "GAPG"),
        }
    }
}

/// Everything the report renders
#[derive(Debug, Clone)]
pub struct WinAnalysis {
    pub options: AnalysisOptions,
    pub split: SeasonSplit,
    /// Won ~ WinPredictor on the training seasons
    pub wins_model: OlsModel,
    pub predictions: Vec<TeamPrediction>,
    pub metrics: EvaluationMetrics,
    pub by_conference: Vec<DimensionAnalysis>,
    pub by_playoffs: Vec<DimensionAnalysis>,
    /// WinPct ~ rate on the training seasons
    pub rate_models: Vec<(RateRegressor, OlsModel)>,
    /// Rate models that could not be fit; the rest of the report stands
    pub rate_failures: Vec<(RateRegressor, ModelFitError)>,
}

/// Score, split, fit the wins model and the rate models, evaluate
pub fn run_analysis(
    records: &[SeasonRecord],
    options: &AnalysisOptions,
) -> Result<WinAnalysis, ModelFitError> {
    let scored = options.predictor.score(records);
    let split = split_by_year(scored, options.split_year);
    info!(
        "Split at {}: {} training rows, {} evaluation rows ({})",
        options.split_year,
        split.train.len(),
        split.eval.len(),
        options.predictor
    );

    let x: Vec<f64> = split.train.iter().map(|s| s.win_predictor).collect();
    let y: Vec<f64> = split.train.iter().map(|s| s.record.won as f64).collect();
    let wins_model = OlsModel::fit(&x, &y, options.with_intercept)?;
    info!(
        "Wins model: slope {:.4}, intercept {:.4}, R² {:.4}",
        wins_model.slope(),
        wins_model.intercept(),
        wins_model.summary().r_squared
    );

    let predictions = predict_seasons(&wins_model, &split.eval);
    if predictions.is_empty() {
        warn!("Evaluation set is empty, skipping metrics");
    }
    let metrics = calculate_metrics(&predictions);

    let mut rate_models = Vec::with_capacity(RateRegressor::ALL.len());
    let mut rate_failures = Vec::new();
    for rate in RateRegressor::ALL {
        let x: Vec<f64> = split.train.iter().map(|s| rate.value(s)).collect();
        let y: Vec<f64> = split.train.iter().map(|s| s.win_pct).collect();
        match OlsModel::fit(&x, &y, options.with_intercept) {
            Ok(model) => rate_models.push((rate, model)),
            Err(e) => {
                warn!("Skipping WinPct ~ {} model: {}", rate, e);
                rate_failures.push((rate, e));
            }
        }
    }

    Ok(WinAnalysis {
        options: options.clone(),
        by_conference: analyze_by_conference(&predictions),
        by_playoffs: analyze_by_playoffs(&predictions),
        split,
        wins_model,
        predictions,
        metrics,
        rate_models,
        rate_failures,
    })
}

/// Apply a fitted wins model to scored seasons
pub fn predict_seasons(model: &OlsModel, seasons: &[ScoredSeason]) -> Vec<TeamPrediction> {
    seasons
        .iter()
        .map(|s| TeamPrediction {
            year: s.record.year,
            team: s.record.team.clone(),
            conference: s.record.conference.clone(),
            won: s.record.won,
            predicted: model.predict(s.win_predictor),
            made_playoffs: s.record.made_playoffs,
        })
        .collect()
}
