//! Accuracy measures for detector labels and forecasts.

mod detection_metrics;
mod forecast_metrics;

pub use detection_metrics::DetectionMetrics;
pub use forecast_metrics::ForecastAccuracy;

use crate::utils::error::{Error, Result};

fn check_pair(what: &str, expected: usize, found: usize) -> Result<()> {
    if expected == 0 {
        return Err(Error::InvalidArgument(format!("{}: nothing to evaluate", what)));
    }
    if expected != found {
        return Err(Error::length_mismatch(what, expected, found));
    }
    Ok(())
}
