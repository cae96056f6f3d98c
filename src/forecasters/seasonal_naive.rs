use super::{finish, interval_z, require_history, ScoredForecaster};
use crate::ensemble::MethodResult;
use crate::utils::error::{Error, Result};

/// Repeats the last observed season: `ŷ[n+h] = x[n - p + (h mod p)]`.
#[derive(Debug, Clone)]
pub struct SeasonalNaiveForecaster {
    name: String,
    period: usize,
    z: f64,
}

impl SeasonalNaiveForecaster {
    pub const DEFAULT_NAME: &'static str = "seasonal_naive";

    pub fn new(period: usize, interval_level: f64) -> Result<Self> {
        if period == 0 {
            return Err(Error::InvalidArgument("seasonal period must be > 0".into()));
        }
        Ok(Self { name: Self::DEFAULT_NAME.to_string(), period, z: interval_z(interval_level)? })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl ScoredForecaster for SeasonalNaiveForecaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn forecast(&self, history: &[f64], horizon: usize) -> Result<MethodResult> {
        let p = self.period;
        require_history(&self.name, history, p + 1)?;
        let n = history.len();
        let last_season = &history[n - p..];
        let forecast = (0..horizon).map(|h| last_season[h % p]).collect();
        let residuals: Vec<f64> = (p..n).map(|t| history[t] - history[t - p]).collect();
        Ok(finish(&self.name, forecast, &residuals, self.z))
    }
}
