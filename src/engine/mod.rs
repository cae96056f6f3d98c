//! Ensemble drivers: run a set of scored methods over the same input and
//! hand their results to the combiner.
//!
//! A method that fails is logged and left out; the remaining methods are
//! still combined. Configured weights are restricted to the surviving
//! methods before combination.

mod anomaly;
mod forecast;

pub use anomaly::{AnomalyEnsemble, MonitorReport, ENSEMBLE_ALERT_METHOD};
pub use forecast::ForecastEnsemble;

use log::warn;

use crate::ensemble::{EnsembleWeightMap, MethodResult};
use crate::utils::error::{Error, Result};

/// Keep successful results whose scores and labels (if any) have the
/// expected length, logging everything else.
fn survivors(outcomes: Vec<(String, Result<MethodResult>)>, expected_len: usize) -> Vec<MethodResult> {
    outcomes
        .into_iter()
        .filter_map(|(method, outcome)| {
            let failure = match outcome {
                | Ok(r) if r.len() != expected_len => Error::MethodFailed {
                    method,
                    reason: format!("returned {} items, expected {}", r.len(), expected_len),
                },
                | Ok(r) => match r.labels.as_ref().map(Vec::len) {
                    | Some(n) if n != expected_len => Error::MethodFailed {
                        method,
                        reason: format!("returned {} labels, expected {}", n, expected_len),
                    },
                    | _ => return Some(r),
                },
                | Err(e) => Error::MethodFailed { method, reason: e.to_string() },
            };
            warn!("dropping method from ensemble: {}", failure);
            None
        })
        .collect()
}

/// Weights for the methods that actually produced results.
fn restrict_weights(weights: Option<&EnsembleWeightMap>, results: &[MethodResult]) -> Option<EnsembleWeightMap> {
    weights.map(|w| {
        w.iter()
            .filter(|(name, _)| results.iter().any(|r| &r.method_name == *name))
            .map(|(name, v)| (name.clone(), *v))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survivors_drop_failures_and_wrong_lengths() {
        let outcomes = vec![
            ("a".to_string(), Ok(MethodResult::new("a", vec![1.0, 2.0]))),
            ("b".to_string(), Err(Error::InvalidArgument("boom".into()))),
            ("c".to_string(), Ok(MethodResult::new("c", vec![1.0]))),
        ];
        let kept = survivors(outcomes, 2);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].method_name, "a");
    }

    #[test]
    fn survivors_drop_short_label_vectors() {
        let outcomes = vec![
            ("a".to_string(), Ok(MethodResult::new("a", vec![0.0, 1.0]).with_labels(vec![false, true]))),
            ("b".to_string(), Ok(MethodResult::new("b", vec![0.0, 1.0]).with_labels(vec![true]))),
            ("c".to_string(), Ok(MethodResult::new("c", vec![0.0, 1.0]))),
        ];
        let kept: Vec<String> = survivors(outcomes, 2).into_iter().map(|r| r.method_name).collect();
        assert_eq!(kept, vec!["a", "c"]);
    }

    #[test]
    fn weights_are_restricted_to_survivors() {
        let w: EnsembleWeightMap = [("a".to_string(), 1.0), ("b".to_string(), 2.0)].into();
        let results = vec![MethodResult::new("a", vec![])];
        let restricted = restrict_weights(Some(&w), &results).unwrap();
        assert_eq!(restricted.len(), 1);
        assert!(restricted.contains_key("a"));
        assert!(restrict_weights(None, &results).is_none());
    }
}
