use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::weights::{self, check_unique_names};
use super::{check_scores, weighted_sum, EnsembleWeightMap, MethodResult};
use crate::utils::error::{Error, Result};

/// Vote share at or above which an item is labelled anomalous.
pub const DEFAULT_VOTING_THRESHOLD: f64 = 0.5;

/// Combined output of a voting ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    /// Weighted average of constituent scores, per item
    pub scores: Vec<f64>,
    /// Weighted share of methods labelling the item true, per item
    pub votes: Vec<f64>,
    /// `votes[i] >= threshold`
    pub labels: Vec<bool>,
    /// Normalised weights actually used
    pub weights: EnsembleWeightMap,
    pub threshold: f64,
    pub anomaly_count: usize,
    /// `anomaly_count / N`, 0.0 for an empty item sequence
    pub anomaly_rate: f64,
    /// Constituent results, for traceability
    pub members: Vec<MethodResult>,
}

impl EnsembleResult {
    /// Indices of the items labelled anomalous.
    pub fn anomaly_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels.iter().enumerate().filter(|(_, l)| **l).map(|(i, _)| i)
    }
}

/// Combine labelled method results by weighted vote.
///
/// With `weights = None` every method receives `1/K`. Supplied weights must
/// cover exactly the methods in `results` and are normalised to sum to 1.0.
/// `threshold` is applied verbatim; values outside `[0, 1]` simply make every
/// or no item pass.
pub fn combine_voting(
    results: &[MethodResult], weights: Option<&EnsembleWeightMap>, threshold: f64,
) -> Result<EnsembleResult> {
    let n = check_scores(results)?;
    check_unique_names(results)?;

    let mut label_rows = Vec::with_capacity(results.len());
    for r in results {
        let labels = r
            .labels
            .as_deref()
            .ok_or_else(|| Error::MissingLabels { method: r.method_name.clone() })?;
        if labels.len() != n {
            return Err(Error::length_mismatch(&r.method_name, n, labels.len()));
        }
        label_rows.push(labels);
    }

    let weights = match weights {
        | Some(w) => weights::normalize(w, results)?,
        | None => weights::uniform(results),
    };
    let w = weights::aligned(&weights, results);
    debug!("voting over {} methods, {} items, threshold {}", results.len(), n, threshold);

    let scores = weighted_sum(results, &w, n, |r| r.scores.as_slice());
    let mut votes = vec![0.0; n];
    for (labels, wk) in label_rows.iter().zip(&w) {
        for (vote, flagged) in votes.iter_mut().zip(labels.iter()) {
            if *flagged {
                *vote += wk;
            }
        }
    }

    let labels: Vec<bool> = votes.iter().map(|v| *v >= threshold).collect();
    let anomaly_count = labels.iter().filter(|l| **l).count();
    let anomaly_rate = if n == 0 { 0.0 } else { anomaly_count as f64 / n as f64 };

    info!(
        "Ensemble voting completed: {} anomalies ({:.2}%) across {} methods",
        anomaly_count,
        anomaly_rate * 100.0,
        results.len()
    );

    Ok(EnsembleResult {
        scores,
        votes,
        labels,
        weights,
        threshold,
        anomaly_count,
        anomaly_rate,
        members: results.to_vec(),
    })
}
