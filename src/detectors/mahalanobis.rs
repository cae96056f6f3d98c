use log::{debug, info};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::{check_rows, check_width, ScoredDetector};
use crate::ensemble::MethodResult;
use crate::utils::error::{Error, Result};

const PSEUDO_INVERSE_EPS: f64 = 1e-10;

#[derive(Debug, Clone)]
struct Baseline {
    mean: DVector<f64>,
    inv_cov: DMatrix<f64>,
    /// χ² quantile the squared distance is compared with
    cutoff: f64,
}

/// Multivariate distance from the baseline mean under the baseline
/// covariance. The score is the distance itself; a row is flagged when the
/// squared distance exceeds the χ² quantile at `level` with one degree of
/// freedom per feature. A singular covariance falls back to its
/// pseudo-inverse.
#[derive(Debug, Clone)]
pub struct MahalanobisDetector {
    name: String,
    level: f64,
    baseline: Option<Baseline>,
}

impl MahalanobisDetector {
    pub const DEFAULT_NAME: &'static str = "mahalanobis";
    pub const DEFAULT_LEVEL: f64 = 0.95;

    pub fn new(level: f64) -> Result<Self> {
        if !(level > 0.0 && level < 1.0) {
            return Err(Error::InvalidArgument(format!("Mahalanobis level must be in (0, 1), got {}", level)));
        }
        Ok(Self { name: Self::DEFAULT_NAME.to_string(), level, baseline: None })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for MahalanobisDetector {
    fn default() -> Self {
        Self { name: Self::DEFAULT_NAME.to_string(), level: Self::DEFAULT_LEVEL, baseline: None }
    }
}

impl ScoredDetector for MahalanobisDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, rows: &[Vec<f64>]) -> Result<()> {
        let p = check_rows(&self.name, rows)?;
        let n = rows.len();
        if n < 2 {
            return Err(Error::InvalidArgument(format!(
                "{}: covariance needs at least 2 rows, got {}",
                self.name, n
            )));
        }

        let mean = DVector::from_fn(p, |j, _| rows.iter().map(|r| r[j]).sum::<f64>() / n as f64);
        let centered = DMatrix::from_fn(n, p, |i, j| rows[i][j] - mean[j]);
        let cov = centered.transpose() * &centered / (n - 1) as f64;
        let inv_cov = match cov.clone().try_inverse() {
            | Some(inv) => inv,
            | None => {
                debug!("{}: covariance is singular, using pseudo-inverse", self.name);
                cov.pseudo_inverse(PSEUDO_INVERSE_EPS)
                    .map_err(|e| Error::InvalidArgument(format!("{}: {}", self.name, e)))?
            }
        };
        let cutoff = ChiSquared::new(p as f64)?.inverse_cdf(self.level);

        self.baseline = Some(Baseline { mean, inv_cov, cutoff });
        Ok(())
    }

    fn score(&self, rows: &[Vec<f64>]) -> Result<MethodResult> {
        let baseline = self
            .baseline
            .as_ref()
            .ok_or_else(|| Error::NotFitted { method: self.name.clone() })?;
        check_width(&self.name, rows, baseline.mean.len())?;

        let squared: Vec<f64> = rows
            .iter()
            .map(|row| {
                let delta = DVector::from_fn(row.len(), |j, _| row[j] - baseline.mean[j]);
                delta.dot(&(&baseline.inv_cov * &delta)).max(0.0)
            })
            .collect();
        let labels: Vec<bool> = squared.iter().map(|d2| *d2 > baseline.cutoff).collect();
        let scores = squared.into_iter().map(f64::sqrt).collect();

        let result = MethodResult::new(self.name.clone(), scores).with_labels(labels);
        info!("{} detection completed: {} anomalies in {} rows", self.name, result.positive_count(), rows.len());
        Ok(result)
    }

    fn is_fitted(&self) -> bool {
        self.baseline.is_some()
    }
}
