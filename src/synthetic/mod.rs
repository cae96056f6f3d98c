//! Seeded synthetic data for exercising detectors and forecasters.
//!
//! All randomness comes from a `StdRng` seeded from [`SyntheticConfig::seed`],
//! so the same configuration always yields the same data.

use std::f64::consts::PI;

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::config::SyntheticConfig;
use crate::utils::error::{Error, Result};

/// Feature rows with ground-truth anomaly labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    pub rows: Vec<Vec<f64>>,
    pub truth: Vec<bool>,
}

/// A daily series of values.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Split off the last `k` points, e.g. as a hold-out set.
    pub fn split_tail(&self, k: usize) -> (TimeSeries, TimeSeries) {
        let at = self.len().saturating_sub(k);
        (
            TimeSeries { dates: self.dates[..at].to_vec(), values: self.values[..at].to_vec() },
            TimeSeries { dates: self.dates[at..].to_vec(), values: self.values[at..].to_vec() },
        )
    }
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    Normal::new(mean, std_dev).map_err(|e| Error::InvalidArgument(format!("normal distribution: {}", e)))
}

/// Rows drawn from N(0, 1) per feature, with a `contamination` share drawn
/// from N(3, √2) and labelled anomalous, shuffled.
pub fn anomaly_dataset(cfg: &SyntheticConfig) -> Result<LabeledDataset> {
    if cfg.samples == 0 || cfg.features == 0 {
        return Err(Error::InvalidArgument("samples and features must be > 0".into()));
    }
    if !(0.0..1.0).contains(&cfg.contamination) {
        return Err(Error::InvalidArgument(format!(
            "contamination must be in [0, 1), got {}",
            cfg.contamination
        )));
    }
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let inlier = normal(0.0, 1.0)?;
    let outlier = normal(3.0, 2f64.sqrt())?;

    let n_normal = (cfg.samples as f64 * (1.0 - cfg.contamination)) as usize;
    let mut labelled: Vec<(Vec<f64>, bool)> = (0..cfg.samples)
        .map(|i| {
            let is_anomaly = i >= n_normal;
            let dist = if is_anomaly { &outlier } else { &inlier };
            let row = (0..cfg.features).map(|_| dist.sample(&mut rng)).collect();
            (row, is_anomaly)
        })
        .collect();
    labelled.shuffle(&mut rng);

    let (rows, truth) = labelled.into_iter().unzip();
    Ok(LabeledDataset { rows, truth })
}

/// Daily cost-like series: linear trend, yearly and weekly seasonality and
/// N(0, 2) noise on a base of 100, floored at 1.
pub fn cost_series(cfg: &SyntheticConfig) -> Result<TimeSeries> {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let noise = normal(0.0, 2.0)?;

    let mut dates = Vec::with_capacity(cfg.days);
    let mut values = Vec::with_capacity(cfg.days);
    for t in 0..cfg.days {
        let date = cfg
            .start_date
            .checked_add_days(Days::new(t as u64))
            .ok_or_else(|| Error::InvalidArgument(format!("date overflow at day {}", t)))?;
        let tf = t as f64;
        let trend = 0.1 * tf;
        let yearly = 10.0 * (2.0 * PI * tf / 365.25).sin();
        let weekly = 5.0 * (2.0 * PI * tf / 7.0).sin();
        let value = 100.0 + trend + yearly + weekly + noise.sample(&mut rng);
        dates.push(date);
        values.push(value.max(1.0));
    }
    Ok(TimeSeries { dates, values })
}
