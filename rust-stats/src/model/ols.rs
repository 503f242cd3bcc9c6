//! Single-regressor ordinary least squares

use serde::{Deserialize, Serialize};

use crate::error::ModelFitError;

/// Estimate with its standard error and t statistic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
}

impl Coefficient {
    fn new(estimate: f64, std_error: f64) -> Self {
        Self {
            estimate,
            std_error,
            t_value: estimate / std_error,
        }
    }
}

/// Fit statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSummary {
    pub n: usize,
    pub intercept: Option<Coefficient>,
    pub slope: Coefficient,
    /// Centered with an intercept, uncentered without one
    pub r_squared: f64,
    pub residual_std_error: f64,
    pub degrees_of_freedom: usize,
}

/// `y = intercept + slope * x`, intercept optional
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OlsModel {
    summary: FitSummary,
}

impl OlsModel {
    /// Fit y on x. At least two points and a non-constant regressor are required.
    pub fn fit(x: &[f64], y: &[f64], with_intercept: bool) -> Result<Self, ModelFitError> {
        if x.len() != y.len() {
            return Err(ModelFitError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(ModelFitError::TooFewObservations {
                needed: 2,
                actual: x.len(),
            });
        }
        if let Some(i) = x
            .iter()
            .zip(y)
            .position(|(a, b)| !a.is_finite() || !b.is_finite())
        {
            return Err(ModelFitError::NonFinite(i));
        }

        let n = x.len();
        let nf = n as f64;
        let params = usize::from(with_intercept) + 1;
        let df = n.saturating_sub(params);

        let (x_center, y_center) = if with_intercept {
            (x.iter().sum::<f64>() / nf, y.iter().sum::<f64>() / nf)
        } else {
            (0.0, 0.0)
        };

        let sxx: f64 = x.iter().map(|v| (v - x_center).powi(2)).sum();
        let sxy: f64 = x
            .iter()
            .zip(y)
            .map(|(a, b)| (a - x_center) * (b - y_center))
            .sum();
        let syy: f64 = y.iter().map(|v| (v - y_center).powi(2)).sum();

        if sxx <= f64::EPSILON * nf {
            return Err(ModelFitError::ZeroVariance);
        }

        let slope = sxy / sxx;
        let intercept = y_center - slope * x_center;

        let ssr: f64 = x
            .iter()
            .zip(y)
            .map(|(a, b)| (b - (intercept + slope * a)).powi(2))
            .sum();

        let sigma2 = if df > 0 { ssr / df as f64 } else { f64::NAN };
        let r_squared = if syy > 0.0 { 1.0 - ssr / syy } else { 1.0 };

        let slope_coef = Coefficient::new(slope, (sigma2 / sxx).sqrt());
        let intercept_coef = with_intercept.then(|| {
            let se = (sigma2 * (1.0 / nf + x_center.powi(2) / sxx)).sqrt();
            Coefficient::new(intercept, se)
        });

        Ok(Self {
            summary: FitSummary {
                n,
                intercept: intercept_coef,
                slope: slope_coef,
                r_squared,
                residual_std_error: sigma2.sqrt(),
                degrees_of_freedom: df,
            },
        })
    }

    pub fn intercept(&self) -> f64 {
        self.summary.intercept.map_or(0.0, |c| c.estimate)
    }

    pub fn slope(&self) -> f64 {
        self.summary.slope.estimate
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept() + self.slope() * x
    }

    pub fn predict_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.predict(x)).collect()
    }

    pub fn summary(&self) -> &FitSummary {
        &self.summary
    }
}
