//! Evaluation metrics
//!
//! Goodness of fit on the held-out seasons, overall and per dimension.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::TeamPrediction;

/// Evaluation-set error metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub n: usize,
    pub r2: f64,
    pub mae: f64,
    pub rmse: f64,
    /// Mean of actual minus predicted
    pub bias: f64,
}

/// Coefficient of determination of `predicted` against `actual`
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        // Constant target: perfect only if every prediction hits it
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Calculate metrics from evaluation predictions
pub fn calculate_metrics(predictions: &[TeamPrediction]) -> EvaluationMetrics {
    if predictions.is_empty() {
        return EvaluationMetrics::default();
    }

    let n = predictions.len();
    let actual: Vec<f64> = predictions.iter().map(|p| p.won as f64).collect();
    let predicted: Vec<f64> = predictions.iter().map(|p| p.predicted).collect();
    let residuals: Vec<f64> = predictions.iter().map(|p| p.residual()).collect();

    let mae = residuals.iter().map(|r| r.abs()).sum::<f64>() / n as f64;
    let mse = residuals.iter().map(|r| r.powi(2)).sum::<f64>() / n as f64;
    let bias = residuals.iter().sum::<f64>() / n as f64;

    EvaluationMetrics {
        n,
        r2: r2_score(&actual, &predicted),
        mae,
        rmse: mse.sqrt(),
        bias,
    }
}

/// Analysis results by dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionAnalysis {
    pub key: String,
    pub teams: usize,
    pub mean_won: f64,
    pub mean_predicted: f64,
    pub mae: f64,
}

/// Analyze evaluation predictions by conference
pub fn analyze_by_conference(predictions: &[TeamPrediction]) -> Vec<DimensionAnalysis> {
    let mut grouped: HashMap<&str, Vec<&TeamPrediction>> = HashMap::new();
    for p in predictions {
        let key = if p.conference.is_empty() {
            "(none)"
        } else {
            p.conference.as_str()
        };
        grouped.entry(key).or_default().push(p);
    }

    summarize_groups(grouped)
}

/// Analyze evaluation predictions by playoff status
pub fn analyze_by_playoffs(predictions: &[TeamPrediction]) -> Vec<DimensionAnalysis> {
    let mut grouped: HashMap<&str, Vec<&TeamPrediction>> = HashMap::new();
    for p in predictions {
        let key = if p.made_playoffs { "yes" } else { "no" };
        grouped.entry(key).or_default().push(p);
    }

    summarize_groups(grouped)
}

fn summarize_groups(grouped: HashMap<&str, Vec<&TeamPrediction>>) -> Vec<DimensionAnalysis> {
    let mut results: Vec<DimensionAnalysis> = grouped
        .iter()
        .map(|(key, group)| {
            let total = group.len() as f64;
            DimensionAnalysis {
                key: key.to_string(),
                teams: group.len(),
                mean_won: group.iter().map(|p| p.won as f64).sum::<f64>() / total,
                mean_predicted: group.iter().map(|p| p.predicted).sum::<f64>() / total,
                mae: group.iter().map(|p| p.residual().abs()).sum::<f64>() / total,
            }
        })
        .collect();

    results.sort_by(|a, b| a.key.cmp(&b.key));
    results
}
