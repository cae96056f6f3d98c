//! Distribution-free statistical detectors: per-feature z-score and
//! interquartile-range fences. A row's score is its worst feature.

use log::info;
use statrs::statistics::{Data, OrderStatistics, Statistics};

use super::{check_width, columns, ScoredDetector};
use crate::ensemble::MethodResult;
use crate::utils::error::{Error, Result};

/// Per-feature mean and population standard deviation.
#[derive(Debug, Clone, PartialEq)]
struct Moments {
    means: Vec<f64>,
    stds: Vec<f64>,
}

/// Flags rows whose largest absolute z-score exceeds `threshold`.
#[derive(Debug, Clone)]
pub struct ZScoreDetector {
    name: String,
    threshold: f64,
    baseline: Option<Moments>,
}

impl ZScoreDetector {
    pub const DEFAULT_NAME: &'static str = "z_score";

    pub fn new(threshold: f64) -> Result<Self> {
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(Error::InvalidArgument(format!("z-score threshold must be > 0, got {}", threshold)));
        }
        Ok(Self { name: Self::DEFAULT_NAME.to_string(), threshold, baseline: None })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl ScoredDetector for ZScoreDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, rows: &[Vec<f64>]) -> Result<()> {
        let cols = columns(&self.name, rows)?;
        let means = cols.iter().map(|c| c.iter().mean()).collect();
        let stds = cols.iter().map(|c| c.iter().population_std_dev()).collect();
        self.baseline = Some(Moments { means, stds });
        Ok(())
    }

    fn score(&self, rows: &[Vec<f64>]) -> Result<MethodResult> {
        let baseline = self
            .baseline
            .as_ref()
            .ok_or_else(|| Error::NotFitted { method: self.name.clone() })?;
        check_width(&self.name, rows, baseline.means.len())?;

        let scores: Vec<f64> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(baseline.means.iter().zip(&baseline.stds))
                    // constant features carry no spread to measure against
                    .filter(|(_, (_, std))| **std > 0.0)
                    .map(|(x, (mean, std))| (x - mean).abs() / std)
                    .fold(0.0, f64::max)
            })
            .collect();
        let labels: Vec<bool> = scores.iter().map(|s| *s > self.threshold).collect();
        let result = MethodResult::new(self.name.clone(), scores).with_labels(labels);
        info!("{} detection completed: {} anomalies in {} rows", self.name, result.positive_count(), rows.len());
        Ok(result)
    }

    fn is_fitted(&self) -> bool {
        self.baseline.is_some()
    }
}

/// Per-feature first and third quartile.
#[derive(Debug, Clone, PartialEq)]
struct Quartiles {
    q1: Vec<f64>,
    q3: Vec<f64>,
}

/// Flags rows with any feature outside `[Q1 - m·IQR, Q3 + m·IQR]`.
#[derive(Debug, Clone)]
pub struct IqrDetector {
    name: String,
    multiplier: f64,
    baseline: Option<Quartiles>,
}

impl IqrDetector {
    pub const DEFAULT_NAME: &'static str = "iqr";

    pub fn new(multiplier: f64) -> Result<Self> {
        if !(multiplier.is_finite() && multiplier >= 0.0) {
            return Err(Error::InvalidArgument(format!("IQR multiplier must be >= 0, got {}", multiplier)));
        }
        Ok(Self { name: Self::DEFAULT_NAME.to_string(), multiplier, baseline: None })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl ScoredDetector for IqrDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, rows: &[Vec<f64>]) -> Result<()> {
        let cols = columns(&self.name, rows)?;
        let mut q1 = Vec::with_capacity(cols.len());
        let mut q3 = Vec::with_capacity(cols.len());
        for col in cols {
            let mut data = Data::new(col);
            q1.push(data.lower_quartile());
            q3.push(data.upper_quartile());
        }
        self.baseline = Some(Quartiles { q1, q3 });
        Ok(())
    }

    fn score(&self, rows: &[Vec<f64>]) -> Result<MethodResult> {
        let baseline = self
            .baseline
            .as_ref()
            .ok_or_else(|| Error::NotFitted { method: self.name.clone() })?;
        check_width(&self.name, rows, baseline.q1.len())?;

        let mut scores = Vec::with_capacity(rows.len());
        let mut labels = Vec::with_capacity(rows.len());
        for row in rows {
            let mut score = 0.0_f64;
            let mut outside = false;
            for (x, (q1, q3)) in row.iter().zip(baseline.q1.iter().zip(&baseline.q3)) {
                let iqr = q3 - q1;
                let (lo, hi) = (q1 - self.multiplier * iqr, q3 + self.multiplier * iqr);
                let deviation = (lo - x).max(x - hi).max(0.0);
                outside |= deviation > 0.0;
                // Constant columns have no spread to scale by.
                score = score.max(if iqr > 0.0 { deviation / iqr } else { deviation });
            }
            scores.push(score);
            labels.push(outside);
        }
        let result = MethodResult::new(self.name.clone(), scores).with_labels(labels);
        info!("{} detection completed: {} anomalies in {} rows", self.name, result.positive_count(), rows.len());
        Ok(result)
    }

    fn is_fitted(&self) -> bool {
        self.baseline.is_some()
    }
}
