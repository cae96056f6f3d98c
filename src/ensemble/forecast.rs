use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::weights::{self, check_unique_names};
use super::{check_scores, weighted_sum, EnsembleWeightMap, MethodResult};
use crate::utils::error::{Error, Result};

/// Combined output of a forecast ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEnsembleResult {
    /// Weighted average forecast over the horizon
    pub forecast: Vec<f64>,
    /// Weighted average of lower bounds, when every member carries an interval
    pub lower: Option<Vec<f64>>,
    /// Weighted average of upper bounds, when every member carries an interval
    pub upper: Option<Vec<f64>>,
    /// Normalised weights actually used
    pub weights: EnsembleWeightMap,
    /// True when inverse-quality weighting was not possible and uniform
    /// weights were substituted
    pub used_fallback_weights: bool,
    /// Weighted average of member quality metrics, when all members report one
    pub quality_metric: Option<f64>,
    /// Constituent results, for traceability
    pub members: Vec<MethodResult>,
}

impl ForecastEnsembleResult {
    pub fn horizon(&self) -> usize {
        self.forecast.len()
    }
}

/// Blend forecasts by weighted average.
///
/// Without explicit weights each method is weighted by the inverse of its
/// quality metric. If any method lacks a positive quality metric the blend
/// falls back to uniform weights and sets `used_fallback_weights`.
///
/// Interval bounds are averaged with the same weights, independently for the
/// lower and upper sequence. This is a linear approximation, not a proper
/// fusion of the underlying uncertainty.
pub fn combine_forecast(
    results: &[MethodResult], weights: Option<&EnsembleWeightMap>,
) -> Result<ForecastEnsembleResult> {
    let n = check_scores(results)?;
    check_unique_names(results)?;
    for r in results {
        for bound in [&r.lower, &r.upper].into_iter().flatten() {
            if bound.len() != n {
                return Err(Error::length_mismatch(&r.method_name, n, bound.len()));
            }
        }
    }

    let (weights, used_fallback_weights) = match weights {
        | Some(w) => (weights::normalize(w, results)?, false),
        | None => match weights::inverse_quality(results) {
            | Some(w) => (w, false),
            | None => {
                warn!(
                    "quality metric missing or non-positive for at least one of {} methods; using uniform weights",
                    results.len()
                );
                (weights::uniform(results), true)
            }
        },
    };
    let w = weights::aligned(&weights, results);

    let forecast = weighted_sum(results, &w, n, |r| r.scores.as_slice());

    let with_interval = results.iter().filter(|r| r.interval().is_some()).count();
    let (lower, upper) = if with_interval == results.len() {
        (
            Some(weighted_sum(results, &w, n, |r| r.lower.as_deref().unwrap_or(&[]))),
            Some(weighted_sum(results, &w, n, |r| r.upper.as_deref().unwrap_or(&[]))),
        )
    } else {
        if with_interval > 0 {
            debug!(
                "only {} of {} methods carry interval bounds; combined interval omitted",
                with_interval,
                results.len()
            );
        }
        (None, None)
    };

    let quality_metric = results
        .iter()
        .zip(&w)
        .map(|(r, wk)| r.quality_metric.map(|q| q * wk))
        .sum::<Option<f64>>();

    info!("Ensemble forecast completed: {} methods, horizon {}, weights {:?}", results.len(), n, weights);

    Ok(ForecastEnsembleResult {
        forecast,
        lower,
        upper,
        weights,
        used_fallback_weights,
        quality_metric,
        members: results.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn intervals_are_averaged_independently() {
        let a = MethodResult::new("a", vec![10.0, 20.0])
            .with_quality(1.0)
            .with_interval(vec![8.0, 18.0], vec![12.0, 22.0]);
        let b = MethodResult::new("b", vec![20.0, 30.0])
            .with_quality(1.0)
            .with_interval(vec![10.0, 20.0], vec![40.0, 50.0]);

        let out = combine_forecast(&[a, b], None).unwrap();
        assert!(!out.used_fallback_weights);
        assert_eq!(out.forecast, vec![15.0, 25.0]);
        assert_eq!(out.lower, Some(vec![9.0, 19.0]));
        assert_eq!(out.upper, Some(vec![26.0, 36.0]));
        assert_eq!(out.quality_metric, Some(1.0));
    }

    #[test]
    fn partial_intervals_are_dropped() {
        let a = MethodResult::new("a", vec![1.0]).with_interval(vec![0.0], vec![2.0]);
        let b = MethodResult::new("b", vec![3.0]);
        let out = combine_forecast(&[a, b], None).unwrap();
        assert!(out.lower.is_none() && out.upper.is_none());
        assert_eq!(out.forecast, vec![2.0]);
    }

    #[test]
    fn missing_quality_falls_back_to_uniform() {
        let a = MethodResult::new("a", vec![1.0]).with_quality(2.0);
        let b = MethodResult::new("b", vec![3.0]);
        let out = combine_forecast(&[a, b], None).unwrap();
        assert!(out.used_fallback_weights);
        assert_eq!(out.weights["a"], 0.5);
        assert!(out.quality_metric.is_none());
    }

    #[test]
    fn explicit_weights_are_not_a_fallback() {
        let a = MethodResult::new("a", vec![0.0]);
        let b = MethodResult::new("b", vec![4.0]);
        let weights: EnsembleWeightMap = [("a".to_string(), 1.0), ("b".to_string(), 3.0)].into();
        let out = combine_forecast(&[a, b], Some(&weights)).unwrap();
        assert!(!out.used_fallback_weights);
        assert_eq!(out.forecast, vec![3.0]);
    }

    #[test]
    fn misaligned_interval_is_rejected() {
        let a = MethodResult::new("a", vec![1.0, 2.0]).with_interval(vec![0.0], vec![2.0, 3.0]);
        assert_matches!(combine_forecast(&[a], None), Err(Error::LengthMismatch { found: 1, .. }));
    }
}
