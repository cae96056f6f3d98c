use log::debug;
use statrs::statistics::Statistics;

use super::{finish, interval_z, require_history, ScoredForecaster};
use crate::ensemble::MethodResult;
use crate::utils::error::Result;

/// Least-squares straight line over the observation index, extended forward.
#[derive(Debug, Clone)]
pub struct LinearTrendForecaster {
    name: String,
    z: f64,
}

impl LinearTrendForecaster {
    pub const DEFAULT_NAME: &'static str = "linear_trend";

    pub fn new(interval_level: f64) -> Result<Self> {
        Ok(Self { name: Self::DEFAULT_NAME.to_string(), z: interval_z(interval_level)? })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// `(intercept, slope)` of the least-squares fit.
    fn fit(history: &[f64]) -> (f64, f64) {
        let xs: Vec<f64> = (0..history.len()).map(|i| i as f64).collect();
        let slope = xs.iter().covariance(history.iter()) / xs.iter().variance();
        let intercept = history.iter().mean() - slope * xs.iter().mean();
        (intercept, slope)
    }
}

impl ScoredForecaster for LinearTrendForecaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn forecast(&self, history: &[f64], horizon: usize) -> Result<MethodResult> {
        require_history(&self.name, history, 2)?;
        let (intercept, slope) = Self::fit(history);
        debug!("{}: intercept {:.4}, slope {:.4}", self.name, intercept, slope);

        let residuals: Vec<f64> = history
            .iter()
            .enumerate()
            .map(|(t, y)| y - (intercept + slope * t as f64))
            .collect();
        let n = history.len();
        let forecast = (n..n + horizon).map(|t| intercept + slope * t as f64).collect();
        Ok(finish(&self.name, forecast, &residuals, self.z))
    }
}
