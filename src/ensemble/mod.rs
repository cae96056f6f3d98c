//! Ensemble combination of independently computed method results.
//!
//! Two combination modes share one weighting core:
//!
//! * [`combine_voting`] blends boolean per-item labels into a weighted vote and
//!   averages the per-item scores (anomaly detection).
//! * [`combine_forecast`] averages continuous forecast values and, when every
//!   input carries them, the lower/upper interval bounds (forecast blending).
//!
//! Both are pure functions over borrowed inputs. Weights are normalised to sum
//! to 1.0 before use; see [`weights`] for the default weighting policies.

mod forecast;
mod voting;
pub mod weights;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::utils::error::{Error, Result};

pub use forecast::{combine_forecast, ForecastEnsembleResult};
pub use voting::{combine_voting, EnsembleResult, DEFAULT_VOTING_THRESHOLD};

/// Mapping from method name to its (normalised) weight.
pub type EnsembleWeightMap = BTreeMap<String, f64>;

/// Output of one named method over a fixed, ordered sequence of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodResult {
    /// Identifier of the method that produced this result
    pub method_name: String,
    /// Per-item score: anomaly strength or forecast value
    pub scores: Vec<f64>,
    /// Per-item anomaly label (voting mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<bool>>,
    /// Scalar error measure, lower is better (e.g. mean absolute error)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_metric: Option<f64>,
    /// Lower interval bound per item (forecast mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<Vec<f64>>,
    /// Upper interval bound per item (forecast mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<Vec<f64>>,
}

impl MethodResult {
    pub fn new(method_name: impl Into<String>, scores: Vec<f64>) -> Self {
        Self {
            method_name: method_name.into(),
            scores,
            labels: None,
            quality_metric: None,
            lower: None,
            upper: None,
        }
    }

    pub fn with_labels(mut self, labels: Vec<bool>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_quality(mut self, quality_metric: f64) -> Self {
        self.quality_metric = Some(quality_metric);
        self
    }

    pub fn with_interval(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.lower = Some(lower);
        self.upper = Some(upper);
        self
    }

    /// Number of items covered by this result.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Number of items labelled true, zero when the result carries no labels.
    pub fn positive_count(&self) -> usize {
        self.labels
            .as_ref()
            .map(|l| l.iter().filter(|b| **b).count())
            .unwrap_or(0)
    }

    /// Both interval bounds, if present.
    pub fn interval(&self) -> Option<(&[f64], &[f64])> {
        match (&self.lower, &self.upper) {
            | (Some(lo), Some(hi)) => Some((lo.as_slice(), hi.as_slice())),
            | _ => None,
        }
    }
}

/// Reject an empty ensemble and any score sequence whose length differs from
/// the first entry. Returns the shared item count.
pub(crate) fn check_scores(results: &[MethodResult]) -> Result<usize> {
    let first = results.first().ok_or(Error::EmptyEnsemble)?;
    let n = first.len();
    for r in results {
        if r.len() != n {
            return Err(Error::length_mismatch(&r.method_name, n, r.len()));
        }
    }
    Ok(n)
}

/// `out[i] = Σ_k weight[k] * pick(result_k)[i]`; every picked slice must be `n` long.
pub(crate) fn weighted_sum<'a, F>(results: &'a [MethodResult], weights: &[f64], n: usize, pick: F) -> Vec<f64>
where
    F: Fn(&'a MethodResult) -> &'a [f64],
{
    let mut out = vec![0.0; n];
    for (r, w) in results.iter().zip(weights) {
        for (acc, v) in out.iter_mut().zip(pick(r)) {
            *acc += w * v;
        }
    }
    out
}
