//! Weight derivation and normalisation.
//!
//! Supplied weights must name exactly the methods being combined. They are
//! divided by their sum so the result always totals 1.0. When no weights are
//! supplied the voting path uses [`uniform`] and the forecast path prefers
//! [`inverse_quality`], falling back to uniform.

use std::collections::BTreeSet;

use log::debug;

use super::{EnsembleWeightMap, MethodResult};
use crate::utils::error::{Error, Result};

/// Method names must be unique for a name-keyed weight map to be meaningful.
pub(crate) fn check_unique_names(results: &[MethodResult]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for r in results {
        if !seen.insert(r.method_name.as_str()) {
            return Err(Error::InvalidWeight(format!(
                "method '{}' appears more than once",
                r.method_name
            )));
        }
    }
    Ok(())
}

/// Equal weight `1/K` for each of the `K` methods.
pub fn uniform(results: &[MethodResult]) -> EnsembleWeightMap {
    let w = 1.0 / results.len() as f64;
    results.iter().map(|r| (r.method_name.clone(), w)).collect()
}

/// `w_k = (1/q_k) / Σ_j (1/q_j)`. `None` when any method lacks a finite,
/// positive quality metric.
pub fn inverse_quality(results: &[MethodResult]) -> Option<EnsembleWeightMap> {
    let inverses = results
        .iter()
        .map(|r| match r.quality_metric {
            | Some(q) if q.is_finite() && q > 0.0 => Some((r.method_name.clone(), 1.0 / q)),
            | _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    let total: f64 = inverses.iter().map(|(_, w)| w).sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    Some(inverses.into_iter().map(|(name, w)| (name, w / total)).collect())
}

/// Validate `weights` against the methods in `results` and scale them to sum to 1.0.
pub fn normalize(weights: &EnsembleWeightMap, results: &[MethodResult]) -> Result<EnsembleWeightMap> {
    for name in weights.keys() {
        if !results.iter().any(|r| &r.method_name == name) {
            return Err(Error::InvalidWeight(format!(
                "weight given for unknown method '{}'",
                name
            )));
        }
    }
    for r in results {
        if !weights.contains_key(&r.method_name) {
            return Err(Error::InvalidWeight(format!("no weight given for method '{}'", r.method_name)));
        }
    }
    if let Some((name, w)) = weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
        return Err(Error::InvalidWeight(format!(
            "weight for '{}' must be finite and non-negative, got {}",
            name, w
        )));
    }

    // dividing by the largest weight first keeps the sum finite near f64::MAX
    let largest = weights.values().copied().fold(0.0, f64::max);
    if !(largest > 0.0) {
        return Err(Error::InvalidWeight("weights must sum to a positive value, got 0".to_string()));
    }
    let total: f64 = weights.values().map(|w| w / largest).sum();
    let normalized: EnsembleWeightMap =
        weights.iter().map(|(k, w)| (k.clone(), w / largest / total)).collect();
    debug!("normalised ensemble weights: {:?}", normalized);
    Ok(normalized)
}

/// Weight of each result, in result order.
pub(crate) fn aligned(weights: &EnsembleWeightMap, results: &[MethodResult]) -> Vec<f64> {
    results
        .iter()
        .map(|r| weights.get(&r.method_name).copied().unwrap_or(0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn named(names: &[&str]) -> Vec<MethodResult> {
        names.iter().map(|n| MethodResult::new(*n, vec![0.0])).collect()
    }

    #[test]
    fn uniform_splits_evenly() {
        let w = uniform(&named(&["a", "b", "c", "d"]));
        assert!(w.values().all(|v| (*v - 0.25).abs() < 1e-12));
    }

    #[test]
    fn normalize_scales_to_one() {
        let results = named(&["a", "b"]);
        let raw: EnsembleWeightMap = [("a".to_string(), 3.0), ("b".to_string(), 1.0)].into();
        let w = normalize(&raw, &results).unwrap();
        assert!((w["a"] - 0.75).abs() < 1e-12);
        assert!((w.values().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_survives_weights_near_f64_max() {
        let results = named(&["a", "b", "c"]);
        let huge: EnsembleWeightMap =
            [("a".to_string(), 1e308), ("b".to_string(), 1e308), ("c".to_string(), 0.0)].into();
        let w = normalize(&huge, &results).unwrap();
        assert_eq!(w["a"], 0.5);
        assert_eq!(w["b"], 0.5);
        assert_eq!(w["c"], 0.0);

        let tiny: EnsembleWeightMap =
            [("a".to_string(), 5e-324), ("b".to_string(), 5e-324), ("c".to_string(), 0.0)].into();
        assert_eq!(normalize(&tiny, &results).unwrap()["a"], 0.5);
    }

    #[test]
    fn normalize_rejects_unknown_and_missing_names() {
        let results = named(&["a", "b"]);
        let extra: EnsembleWeightMap =
            [("a".to_string(), 1.0), ("b".to_string(), 1.0), ("c".to_string(), 1.0)].into();
        assert_matches!(normalize(&extra, &results), Err(Error::InvalidWeight(msg)) if msg.contains("'c'"));

        let missing: EnsembleWeightMap = [("a".to_string(), 1.0)].into();
        assert_matches!(normalize(&missing, &results), Err(Error::InvalidWeight(msg)) if msg.contains("'b'"));
    }

    #[test]
    fn normalize_rejects_non_positive_sum_and_negative_weight() {
        let results = named(&["a", "b"]);
        let zero: EnsembleWeightMap = [("a".to_string(), 0.0), ("b".to_string(), 0.0)].into();
        assert_matches!(normalize(&zero, &results), Err(Error::InvalidWeight(_)));

        let negative: EnsembleWeightMap = [("a".to_string(), 2.0), ("b".to_string(), -1.0)].into();
        assert_matches!(normalize(&negative, &results), Err(Error::InvalidWeight(_)));
    }

    #[test]
    fn inverse_quality_requires_every_metric() {
        let results = vec![
            MethodResult::new("a", vec![]).with_quality(2.0),
            MethodResult::new("b", vec![]),
        ];
        assert!(inverse_quality(&results).is_none());

        let results = vec![
            MethodResult::new("a", vec![]).with_quality(2.0),
            MethodResult::new("b", vec![]).with_quality(0.0),
        ];
        assert!(inverse_quality(&results).is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        assert_matches!(check_unique_names(&named(&["a", "a"])), Err(Error::InvalidWeight(_)));
        assert!(check_unique_names(&named(&["a", "b"])).is_ok());
    }
}
