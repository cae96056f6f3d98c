//! Configuration for the ensemble drivers.
//!
//! Every tunable that used to be an ambient default (contamination rate,
//! random seed, start date, thresholds) lives here and is passed explicitly
//! into the code that needs it.

mod template;

use crate::detectors::{IqrDetector, MahalanobisDetector, MissingValues, ZScoreDetector};
use crate::ensemble::{EnsembleWeightMap, DEFAULT_VOTING_THRESHOLD};
use crate::forecasters::DEFAULT_INTERVAL_LEVEL;
use crate::utils::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

pub use template::{generate_commented_config_template, generate_config_template};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Configuration file version
    pub version: String,

    /// Anomaly voting ensemble
    #[serde(default)]
    pub voting: VotingConfig,

    /// Forecast blending ensemble
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Cleaning of raw feature rows
    #[serde(default)]
    pub preprocess: PreprocessConfig,

    /// Synthetic data generation
    #[serde(default)]
    pub synthetic: SyntheticConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Anomaly voting ensemble configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingConfig {
    /// Weighted vote share at or above which an item is anomalous
    #[serde(default = "default_voting_threshold")]
    pub threshold: f64,

    /// Per-detector weights; uniform when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<EnsembleWeightMap>,

    /// Absolute z-score above which the z-score detector flags a row
    #[serde(default = "default_z_score_threshold")]
    pub z_score_threshold: f64,

    /// Fence multiplier for the IQR detector
    #[serde(default = "default_iqr_multiplier")]
    pub iqr_multiplier: f64,

    /// χ² level of the Mahalanobis detector's cutoff
    #[serde(default = "default_mahalanobis_level")]
    pub mahalanobis_level: f64,

    /// Detectors in the ensemble: any of z_score, iqr, mahalanobis
    #[serde(default = "default_detectors")]
    pub detectors: Vec<String>,
}

/// Feature row preprocessing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// drop, interpolate or forward_fill
    #[serde(default)]
    pub missing_values: MissingValues,

    /// Scale features to zero mean and unit variance
    #[serde(default = "default_standardize")]
    pub standardize: bool,
}

/// Forecast ensemble configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Number of steps to forecast
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Per-forecaster weights; inverse-MAE when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<EnsembleWeightMap>,

    /// Central coverage of the forecast interval (0.95 = 95%)
    #[serde(default = "default_interval_level")]
    pub interval_level: f64,

    /// Window of the moving-average forecaster
    #[serde(default = "default_moving_average_window")]
    pub moving_average_window: usize,

    /// Season length of the seasonal-naive forecaster
    #[serde(default = "default_seasonal_period")]
    pub seasonal_period: usize,

    /// Drop history points beyond this many standard deviations; disabled when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlier_sigma: Option<f64>,
}

/// Synthetic data configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// RNG seed; identical seeds give identical data
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Rows in the labelled anomaly dataset
    #[serde(default = "default_samples")]
    pub samples: usize,

    /// Features per row
    #[serde(default = "default_features")]
    pub features: usize,

    /// Share of rows drawn from the anomalous distribution
    #[serde(default = "default_contamination")]
    pub contamination: f64,

    /// Length of the daily cost series
    #[serde(default = "default_days")]
    pub days: usize,

    /// Date of the first point in the cost series
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            voting: VotingConfig::default(),
            forecast: ForecastConfig::default(),
            preprocess: PreprocessConfig::default(),
            synthetic: SyntheticConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            threshold: default_voting_threshold(),
            weights: None,
            z_score_threshold: default_z_score_threshold(),
            iqr_multiplier: default_iqr_multiplier(),
            mahalanobis_level: default_mahalanobis_level(),
            detectors: default_detectors(),
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { missing_values: MissingValues::default(), standardize: default_standardize() }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            weights: None,
            interval_level: default_interval_level(),
            moving_average_window: default_moving_average_window(),
            seasonal_period: default_seasonal_period(),
            outlier_sigma: None,
        }
    }
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            samples: default_samples(),
            features: default_features(),
            contamination: default_contamination(),
            days: default_days(),
            start_date: default_start_date(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

// --------- Helper default functions for serde ---------
fn default_voting_threshold() -> f64 {
    DEFAULT_VOTING_THRESHOLD
}
fn default_z_score_threshold() -> f64 {
    3.0
}
fn default_iqr_multiplier() -> f64 {
    1.5
}
fn default_mahalanobis_level() -> f64 {
    MahalanobisDetector::DEFAULT_LEVEL
}
fn default_detectors() -> Vec<String> {
    vec![ZScoreDetector::DEFAULT_NAME.to_string(), IqrDetector::DEFAULT_NAME.to_string()]
}
fn default_standardize() -> bool {
    true
}
fn default_horizon() -> usize {
    30
}
fn default_interval_level() -> f64 {
    DEFAULT_INTERVAL_LEVEL
}
fn default_moving_average_window() -> usize {
    7
}
fn default_seasonal_period() -> usize {
    7
}
fn default_seed() -> u64 {
    42
}
fn default_samples() -> usize {
    1_000
}
fn default_features() -> usize {
    5
}
fn default_contamination() -> f64 {
    0.1
}
fn default_days() -> usize {
    365
}
fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN)
}
fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Detector names accepted in `voting.detectors`.
pub const KNOWN_DETECTORS: [&str; 3] =
    [ZScoreDetector::DEFAULT_NAME, IqrDetector::DEFAULT_NAME, MahalanobisDetector::DEFAULT_NAME];

impl Config {
    /// Serialize default config to TOML string
    pub fn default_toml() -> Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {:?}: {}", path.as_ref(), e))
        })?;
        let mut cfg: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;
        cfg.merge_env()?;
        Ok(cfg)
    }

    /// Save the configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigError(format!("Failed to create directory {:?}: {}", parent, e))
            })?;
        }
        std::fs::write(path, content).map_err(|e| {
            Error::ConfigError(format!("Failed to write config file {:?}: {}", path, e))
        })?;
        Ok(())
    }

    /// Validate the configuration for required fields and reasonable values
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::ConfigError("Config version must be set (e.g., '0.1.0')".to_string()));
        }
        // Voting config; the threshold itself is deliberately unclamped
        if !self.voting.threshold.is_finite() {
            return Err(Error::ConfigError("voting.threshold must be a finite number".to_string()));
        }
        if !(self.voting.z_score_threshold > 0.0) {
            return Err(Error::ConfigError("voting.z_score_threshold must be > 0".to_string()));
        }
        if !(self.voting.iqr_multiplier >= 0.0) {
            return Err(Error::ConfigError("voting.iqr_multiplier must be >= 0".to_string()));
        }
        if !(self.voting.mahalanobis_level > 0.0 && self.voting.mahalanobis_level < 1.0) {
            return Err(Error::ConfigError("voting.mahalanobis_level must be in (0, 1)".to_string()));
        }
        if self.voting.detectors.is_empty() {
            return Err(Error::ConfigError("voting.detectors must name at least one detector".to_string()));
        }
        for (i, name) in self.voting.detectors.iter().enumerate() {
            if !KNOWN_DETECTORS.contains(&name.as_str()) {
                return Err(Error::ConfigError(format!(
                    "Unknown detector '{}' in voting.detectors (expected one of {:?})",
                    name, KNOWN_DETECTORS
                )));
            }
            if self.voting.detectors[..i].contains(name) {
                return Err(Error::ConfigError(format!("Detector '{}' listed twice in voting.detectors", name)));
            }
        }
        check_weights("voting.weights", self.voting.weights.as_ref())?;
        // Forecast config
        if self.forecast.horizon == 0 {
            return Err(Error::ConfigError("forecast.horizon must be > 0".to_string()));
        }
        if !(self.forecast.interval_level > 0.0 && self.forecast.interval_level < 1.0) {
            return Err(Error::ConfigError("forecast.interval_level must be in (0, 1)".to_string()));
        }
        if self.forecast.moving_average_window == 0 || self.forecast.seasonal_period == 0 {
            return Err(Error::ConfigError(
                "forecast.moving_average_window and forecast.seasonal_period must be > 0".to_string(),
            ));
        }
        if let Some(sigma) = self.forecast.outlier_sigma {
            if !(sigma > 0.0) {
                return Err(Error::ConfigError("forecast.outlier_sigma must be > 0".to_string()));
            }
        }
        check_weights("forecast.weights", self.forecast.weights.as_ref())?;
        // Synthetic config
        if !(0.0..1.0).contains(&self.synthetic.contamination) {
            return Err(Error::ConfigError("synthetic.contamination must be in [0, 1)".to_string()));
        }
        if self.synthetic.samples == 0 || self.synthetic.features == 0 || self.synthetic.days == 0 {
            return Err(Error::ConfigError(
                "synthetic.samples, synthetic.features and synthetic.days must be > 0".to_string(),
            ));
        }
        // Logging config
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(Error::ConfigError(format!("Unknown log level '{}'", self.logging.level)));
        }
        Ok(())
    }

    /// Load configuration from default locations: `./config.toml`, then
    /// `<config dir>/ensemble-combiner/config.toml`, then defaults. A file
    /// that exists but does not parse is an error.
    pub fn load() -> Result<Self> {
        let user = dirs::config_dir().map(|dir| dir.join("ensemble-combiner").join("config.toml"));
        Self::load_from(Path::new("config.toml"), user.as_deref())
    }

    fn load_from(local: &Path, user: Option<&Path>) -> Result<Self> {
        for candidate in std::iter::once(local).chain(user) {
            if candidate.exists() {
                return Self::from_file(candidate);
            }
        }

        // Return default config if no config file found
        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    /// Merge environment variables into the configuration
    pub fn merge_env(&mut self) -> Result<()> {
        if let Ok(level) = env::var("ENSEMBLE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(seed) = env::var("ENSEMBLE_SEED") {
            self.synthetic.seed = parse_env("ENSEMBLE_SEED", &seed)?;
        }

        if let Ok(threshold) = env::var("ENSEMBLE_VOTING_THRESHOLD") {
            self.voting.threshold = parse_env("ENSEMBLE_VOTING_THRESHOLD", &threshold)?;
        }

        if let Ok(horizon) = env::var("ENSEMBLE_FORECAST_HORIZON") {
            self.forecast.horizon = parse_env("ENSEMBLE_FORECAST_HORIZON", &horizon)?;
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::ConfigError(format!("Invalid value for {}: '{}' ({})", key, value, e)))
}

fn check_weights(section: &str, weights: Option<&EnsembleWeightMap>) -> Result<()> {
    let Some(weights) = weights else {
        return Ok(());
    };
    if let Some((name, w)) = weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
        return Err(Error::ConfigError(format!(
            "{}.{} must be finite and non-negative, got {}",
            section, name, w
        )));
    }
    if !(weights.values().sum::<f64>() > 0.0) {
        return Err(Error::ConfigError(format!("{} must sum to a positive value", section)));
    }
    Ok(())
}
