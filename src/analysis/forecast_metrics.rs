use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::check_pair;
use crate::utils::error::Result;
use crate::utils::series::mean_abs_error;

/// Point-forecast accuracy against realised values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastAccuracy {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// Mean absolute percentage error, in percent
    pub mape: f64,
    /// Symmetric MAPE, in percent
    pub smape: f64,
    /// Pearson correlation; NaN when either side is constant
    pub correlation: f64,
}

impl ForecastAccuracy {
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        check_pair("predicted", actual.len(), predicted.len())?;
        let n = actual.len() as f64;

        let mae = mean_abs_error(actual, predicted);
        let mse = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum::<f64>() / n;
        let mape = actual.iter().zip(predicted).map(|(a, p)| ((a - p) / a).abs()).sum::<f64>() / n * 100.0;
        let smape = actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| 2.0 * (a - p).abs() / (a.abs() + p.abs()))
            .sum::<f64>()
            / n
            * 100.0;
        let correlation = if actual.len() > 1 {
            actual.iter().covariance(predicted.iter())
                / (actual.iter().std_dev() * predicted.iter().std_dev())
        } else {
            f64::NAN
        };

        Ok(Self { mae, mse, rmse: mse.sqrt(), mape, smape, correlation })
    }
}
