use serde::{Deserialize, Serialize};

use super::check_pair;
use crate::utils::error::Result;

/// Confusion-matrix summary of predicted against true anomaly labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionMetrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub accuracy: f64,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl DetectionMetrics {
    pub fn evaluate(predicted: &[bool], truth: &[bool]) -> Result<Self> {
        check_pair("truth", predicted.len(), truth.len())?;

        let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
        for (p, t) in predicted.iter().zip(truth) {
            match (*p, *t) {
                | (true, true) => tp += 1,
                | (true, false) => fp += 1,
                | (false, false) => tn += 1,
                | (false, true) => fn_ += 1,
            }
        }

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Ok(Self {
            true_positives: tp,
            false_positives: fp,
            true_negatives: tn,
            false_negatives: fn_,
            precision,
            recall,
            f1_score,
            accuracy: ratio(tp + tn, predicted.len()),
        })
    }
}
