//! Scored forecasters.
//!
//! Each forecaster extends a univariate history by `horizon` steps and reports
//! its in-sample mean absolute error as the quality metric, so forecast
//! ensembles can weight members by inverse error.

mod linear_trend;
mod moving_average;
mod seasonal_naive;

pub use linear_trend::LinearTrendForecaster;
pub use moving_average::MovingAverageForecaster;
pub use seasonal_naive::SeasonalNaiveForecaster;

use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;

use crate::ensemble::MethodResult;
use crate::utils::error::{Error, Result};

/// Interval level used when none is configured.
pub const DEFAULT_INTERVAL_LEVEL: f64 = 0.95;

/// A forecaster producing point forecasts, interval bounds and a quality metric.
pub trait ScoredForecaster: Send + Sync {
    /// Method name used as the key in ensemble weight maps.
    fn name(&self) -> &str;

    /// Forecast `horizon` steps past the end of `history`.
    fn forecast(&self, history: &[f64], horizon: usize) -> Result<MethodResult>;
}

/// Two-sided standard normal quantile for a central interval of `level`
/// (0.95 → ~1.96).
pub fn interval_z(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(Error::InvalidArgument(format!("interval level must be in (0, 1), got {}", level)));
    }
    let normal = Normal::new(0.0, 1.0)?;
    Ok(normal.inverse_cdf(1.0 - (1.0 - level) / 2.0))
}

pub(crate) fn require_history(method: &str, history: &[f64], min_len: usize) -> Result<()> {
    if history.len() < min_len {
        return Err(Error::InvalidArgument(format!(
            "{}: needs at least {} observations, got {}",
            method,
            min_len,
            history.len()
        )));
    }
    if history.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidArgument(format!("{}: history contains non-finite values", method)));
    }
    Ok(())
}

/// Attach quality (MAE of `residuals`) and a `± z·σ` band to a point forecast.
pub(crate) fn finish(method: &str, forecast: Vec<f64>, residuals: &[f64], z: f64) -> MethodResult {
    let mae = if residuals.is_empty() {
        0.0
    } else {
        residuals.iter().map(|r| r.abs()).sum::<f64>() / residuals.len() as f64
    };
    let sigma = if residuals.len() > 1 { residuals.iter().std_dev() } else { 0.0 };
    let half_width = z * sigma;
    let lower = forecast.iter().map(|f| f - half_width).collect();
    let upper = forecast.iter().map(|f| f + half_width).collect();
    MethodResult::new(method, forecast)
        .with_quality(mae)
        .with_interval(lower, upper)
}
