//! Configuration template generation

use crate::config::Config;
use crate::utils::error::{Error, Result};
use std::fs;
use std::path::Path;

const COMMENTED_TEMPLATE: &str = r#"# ensemble-combiner configuration
# This is a template configuration file with all available options.
# Uncomment and modify the values as needed.
version = "0.1.0"

[voting]
# Weighted vote share at or above which an item is labelled anomalous.
# Values outside [0, 1] are accepted as-is.
threshold = 0.5

# Absolute z-score above which the z-score detector flags a row
z_score_threshold = 3.0

# Fence multiplier for the IQR detector (Q1 - m*IQR, Q3 + m*IQR)
iqr_multiplier = 1.5

# Chi-square level of the Mahalanobis detector's cutoff
mahalanobis_level = 0.95

# Detectors run by the ensemble: z_score, iqr, mahalanobis
detectors = ["z_score", "iqr"]

# Per-detector weights; they are normalised to sum to 1.
# When omitted every detector gets an equal share.
# [voting.weights]
# z_score = 2.0
# iqr = 1.0

[forecast]
# Number of steps to forecast
horizon = 30

# Central coverage of forecast intervals (0.95 = 95%)
interval_level = 0.95

# Window of the moving-average forecaster
moving_average_window = 7

# Season length of the seasonal-naive forecaster
seasonal_period = 7

# Drop history points further than this many standard deviations from the mean
# outlier_sigma = 3.0

# Per-forecaster weights. When omitted, forecasters are weighted by the inverse
# of their in-sample mean absolute error.
# [forecast.weights]
# moving_average = 1.0
# linear_trend = 1.0
# seasonal_naive = 1.0

[preprocess]
# Missing feature values: drop, interpolate or forward_fill.
# Rows still holding NaN or infinity afterwards are removed.
missing_values = "interpolate"

# Scale features to zero mean and unit variance
standardize = true

[synthetic]
# RNG seed; identical seeds give identical data
seed = 42

# Rows and features of the labelled anomaly dataset
samples = 1000
features = 5

# Share of rows drawn from the anomalous distribution
contamination = 0.1

# Length and first date of the daily cost series
days = 365
start_date = "2023-01-01"

[logging]
# error, warn, info, debug, trace
level = "info"
"#;

/// Generate a default configuration file at the specified path
pub fn generate_config_template<P: AsRef<Path>>(path: P) -> Result<()> {
    let config = Config::default();
    config
        .save(path)
        .map_err(|e| Error::ConfigError(e.to_string()))
}

/// Generate a configuration file with comments explaining each field
pub fn generate_commented_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, COMMENTED_TEMPLATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn commented_template_matches_defaults() {
        let parsed: Config = toml::from_str(COMMENTED_TEMPLATE).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn templates_are_written() {
        let dir = tempdir().unwrap();
        let plain = dir.path().join("plain.toml");
        let commented = dir.path().join("sub").join("commented.toml");

        generate_config_template(&plain).unwrap();
        generate_commented_config_template(&commented).unwrap();

        let plain: Config = toml::from_str(&fs::read_to_string(plain).unwrap()).unwrap();
        assert_eq!(plain, Config::default());
        assert!(fs::read_to_string(commented).unwrap().contains("[forecast.weights]"));
    }
}
