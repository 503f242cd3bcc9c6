//! Heuristic win predictors
//!
//! Neither variant is fitted: both turn a season's scoring rates into an
//! expected win count that the OLS layer then regresses actual wins on.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{ScoredSeason, SeasonRecord};

pub const DEFAULT_BASE_RATE: f64 = 0.5;
pub const DEFAULT_WEIGHT: f64 = 0.08;
pub const DEFAULT_EXPONENT: f64 = 1.23;

/// Expected wins from goals-per-game and goals-against-per-game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WinPredictor {
    /// `(base_rate + weight * (GPG - GAPG)) * games`, floored at zero
    Linear { base_rate: f64, weight: f64 },
    /// `games * GPG^e / (GPG^e + GAPG^e)`
    Pythagorean { exponent: f64 },
}

impl Default for WinPredictor {
    fn default() -> Self {
        WinPredictor::Linear {
            base_rate: DEFAULT_BASE_RATE,
            weight: DEFAULT_WEIGHT,
        }
    }
}

impl WinPredictor {
    pub fn pythagorean(exponent: f64) -> Self {
        WinPredictor::Pythagorean { exponent }
    }

    /// Predicted wins, rounded to one decimal. Never negative.
    pub fn predict(&self, record: &SeasonRecord) -> f64 {
        let games = record.games as f64;
        let raw = match *self {
            WinPredictor::Linear { base_rate, weight } => {
                (base_rate + weight * (record.gpg - record.gapg)) * games
            }
            WinPredictor::Pythagorean { exponent } => {
                games * expected_win_pct(record.gpg, record.gapg, exponent)
            }
        };
        round_to(raw.max(0.0), 1)
    }

    /// Attach win percentage and predictor to every record
    pub fn score(&self, records: &[SeasonRecord]) -> Vec<ScoredSeason> {
        records
            .iter()
            .map(|record| ScoredSeason {
                win_pct: record.win_pct(),
                win_predictor: self.predict(record),
                record: record.clone(),
            })
            .collect()
    }
}

impl fmt::Display for WinPredictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinPredictor::Linear { base_rate, weight } => {
                write!(f, "linear (base {}, weight {})", base_rate, weight)
            }
            WinPredictor::Pythagorean { exponent } => {
                write!(f, "pythagorean (exponent {})", exponent)
            }
        }
    }
}

/// Pythagorean expectation. 0.5 when neither side scored.
pub fn expected_win_pct(gpg: f64, gapg: f64, exponent: f64) -> f64 {
    let scored = gpg.powf(exponent);
    let allowed = gapg.powf(exponent);
    let total = scored + allowed;
    if total == 0.0 {
        0.5
    } else {
        scored / total
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
