use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;

use super::{restrict_weights, survivors};
use crate::config::VotingConfig;
use crate::detectors::{AnomalyAlert, IqrDetector, MahalanobisDetector, ScoredDetector, ZScoreDetector};
use crate::ensemble::{combine_voting, EnsembleResult, EnsembleWeightMap, MethodResult, DEFAULT_VOTING_THRESHOLD};
use crate::utils::error::{Error, Result};

/// Method name carried by alerts raised on the combined vote.
pub const ENSEMBLE_ALERT_METHOD: &str = "ensemble";

/// Outcome of scoring a batch against fitted baselines.
#[derive(Debug, Clone)]
pub struct MonitorReport {
    pub result: EnsembleResult,
    /// One alert per row the vote labelled anomalous
    pub alerts: Vec<AnomalyAlert>,
}

/// Runs every registered detector over the same feature matrix and combines
/// the labels by weighted vote.
pub struct AnomalyEnsemble {
    detectors: Vec<Box<dyn ScoredDetector>>,
    weights: Option<EnsembleWeightMap>,
    threshold: f64,
}

impl std::fmt::Debug for AnomalyEnsemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnomalyEnsemble")
            .field("detectors", &self.method_names())
            .field("weights", &self.weights)
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl Default for AnomalyEnsemble {
    fn default() -> Self {
        Self::new(DEFAULT_VOTING_THRESHOLD)
    }
}

impl AnomalyEnsemble {
    /// An empty ensemble. Add detectors with [`with_detector`](Self::with_detector).
    pub fn new(threshold: f64) -> Self {
        Self { detectors: Vec::new(), weights: None, threshold }
    }

    /// Detectors listed in `voting.detectors`, configured from the same section.
    pub fn from_config(cfg: &VotingConfig) -> Result<Self> {
        let mut ensemble = Self::new(cfg.threshold);
        for name in &cfg.detectors {
            let detector: Box<dyn ScoredDetector> = match name.as_str() {
                | ZScoreDetector::DEFAULT_NAME => Box::new(ZScoreDetector::new(cfg.z_score_threshold)?),
                | IqrDetector::DEFAULT_NAME => Box::new(IqrDetector::new(cfg.iqr_multiplier)?),
                | MahalanobisDetector::DEFAULT_NAME => Box::new(MahalanobisDetector::new(cfg.mahalanobis_level)?),
                | other => return Err(Error::ConfigError(format!("Unknown detector '{}'", other))),
            };
            ensemble.detectors.push(detector);
        }
        ensemble.weights = cfg.weights.clone();
        Ok(ensemble)
    }

    pub fn with_detector(mut self, detector: impl ScoredDetector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    pub fn with_weights(mut self, weights: EnsembleWeightMap) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Fit every detector on `rows` and vote on the same rows.
    ///
    /// Detectors that fail are dropped with a warning. If none succeed the
    /// call fails with [`Error::EmptyEnsemble`].
    pub fn run(&mut self, rows: &[Vec<f64>]) -> Result<EnsembleResult> {
        if self.detectors.is_empty() {
            return Err(Error::EmptyEnsemble);
        }
        debug!("running {} detectors over {} rows", self.detectors.len(), rows.len());

        let outcomes: Vec<_> =
            self.detectors.par_iter_mut().map(|d| (d.name().to_string(), d.detect(rows))).collect();
        self.vote(outcomes, rows.len())
    }

    /// Learn every detector's baseline from `baseline`. Returns how many
    /// detectors were fitted; failures are logged and leave that detector
    /// unfitted or on its previous baseline.
    pub fn fit(&mut self, baseline: &[Vec<f64>]) -> Result<usize> {
        let outcomes: Vec<_> =
            self.detectors.par_iter_mut().map(|d| (d.name().to_string(), d.fit(baseline))).collect();
        let mut fitted = 0;
        for (method, outcome) in outcomes {
            match outcome {
                | Ok(()) => fitted += 1,
                | Err(e) => warn!("{} could not be fitted: {}", method, e),
            }
        }
        if fitted == 0 {
            return Err(Error::EmptyEnsemble);
        }
        info!("{} of {} detectors fitted on {} rows", fitted, self.detectors.len(), baseline.len());
        Ok(fitted)
    }

    /// Score `rows` against the fitted baselines and vote. Unfitted
    /// detectors are left out.
    pub fn score(&self, rows: &[Vec<f64>]) -> Result<EnsembleResult> {
        if self.detectors.is_empty() {
            return Err(Error::EmptyEnsemble);
        }
        let outcomes: Vec<_> = self.detectors.par_iter().map(|d| (d.name().to_string(), d.score(rows))).collect();
        self.vote(outcomes, rows.len())
    }

    /// [`score`](Self::score) plus an alert for every row the vote flags,
    /// stamped with `at`.
    pub fn monitor(&self, rows: &[Vec<f64>], at: DateTime<Utc>) -> Result<MonitorReport> {
        let result = self.score(rows)?;
        let alerts = AnomalyAlert::collect(ENSEMBLE_ALERT_METHOD, &result.scores, &result.labels, rows, at);
        if !alerts.is_empty() {
            warn!("{} anomalies detected in {} new rows", alerts.len(), rows.len());
        }
        Ok(MonitorReport { result, alerts })
    }

    fn vote(&self, outcomes: Vec<(String, Result<MethodResult>)>, expected_len: usize) -> Result<EnsembleResult> {
        let results = survivors(outcomes, expected_len);
        if results.is_empty() {
            return Err(Error::EmptyEnsemble);
        }
        if results.len() < self.detectors.len() {
            info!("{} of {} detectors contributed", results.len(), self.detectors.len());
        }

        let weights = restrict_weights(self.weights.as_ref(), &results);
        combine_voting(&results, weights.as_ref(), self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    struct Failing;

    impl ScoredDetector for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn fit(&mut self, _rows: &[Vec<f64>]) -> Result<()> {
            Err(Error::Other("no model".into()))
        }

        fn score(&self, _rows: &[Vec<f64>]) -> Result<MethodResult> {
            Err(Error::NotFitted { method: "failing".into() })
        }

        fn is_fitted(&self) -> bool {
            false
        }
    }

    struct Fixed(&'static str, Vec<bool>);

    impl ScoredDetector for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn fit(&mut self, _rows: &[Vec<f64>]) -> Result<()> {
            Ok(())
        }

        fn score(&self, _rows: &[Vec<f64>]) -> Result<MethodResult> {
            let scores = self.1.iter().map(|l| if *l { 1.0 } else { 0.0 }).collect();
            Ok(MethodResult::new(self.0, scores).with_labels(self.1.clone()))
        }

        fn is_fitted(&self) -> bool {
            true
        }
    }

    fn rows() -> Vec<Vec<f64>> {
        vec![vec![0.0], vec![0.1], vec![-0.1], vec![25.0]]
    }

    fn baseline() -> Vec<Vec<f64>> {
        (0..40).map(|i| vec![(i % 5) as f64, (i % 7) as f64]).collect()
    }

    fn all_detectors() -> VotingConfig {
        VotingConfig {
            detectors: vec!["z_score".into(), "iqr".into(), "mahalanobis".into()],
            ..VotingConfig::default()
        }
    }

    #[test]
    fn empty_ensemble_fails() {
        assert_matches!(AnomalyEnsemble::default().run(&rows()), Err(Error::EmptyEnsemble));
        assert_matches!(AnomalyEnsemble::default().score(&rows()), Err(Error::EmptyEnsemble));
    }

    #[test]
    fn failing_detector_is_dropped() {
        let mut ensemble = AnomalyEnsemble::new(0.5)
            .with_detector(Fixed("a", vec![false, false, false, true]))
            .with_detector(Failing);
        let out = ensemble.run(&rows()).unwrap();
        assert_eq!(out.members.len(), 1);
        assert_eq!(out.labels, vec![false, false, false, true]);
        assert_eq!(out.weights["a"], 1.0);
    }

    #[test]
    fn all_failing_is_empty() {
        let mut ensemble = AnomalyEnsemble::new(0.5).with_detector(Failing);
        assert_matches!(ensemble.run(&rows()), Err(Error::EmptyEnsemble));
        assert_matches!(ensemble.fit(&rows()), Err(Error::EmptyEnsemble));
    }

    #[test]
    fn configured_weights_skip_dropped_methods() {
        let weights: EnsembleWeightMap =
            [("a".to_string(), 3.0), ("b".to_string(), 1.0), ("failing".to_string(), 5.0)].into();
        let mut ensemble = AnomalyEnsemble::new(0.5)
            .with_detector(Fixed("a", vec![true, false, false, false]))
            .with_detector(Fixed("b", vec![false, true, false, false]))
            .with_detector(Failing)
            .with_weights(weights);
        let out = ensemble.run(&rows()).unwrap();
        assert!((out.weights["a"] - 0.75).abs() < 1e-12);
        assert_eq!(out.labels, vec![true, false, false, false]);
        assert!(!out.weights.contains_key("failing"));
    }

    #[test]
    fn from_config_registers_listed_detectors() {
        let ensemble = AnomalyEnsemble::from_config(&VotingConfig::default()).unwrap();
        assert_eq!(ensemble.method_names(), vec!["z_score", "iqr"]);
        assert_eq!(ensemble.threshold(), 0.5);

        let ensemble = AnomalyEnsemble::from_config(&all_detectors()).unwrap();
        assert_eq!(ensemble.method_names(), vec!["z_score", "iqr", "mahalanobis"]);

        let cfg = VotingConfig { detectors: vec!["lof".into()], ..VotingConfig::default() };
        assert_matches!(AnomalyEnsemble::from_config(&cfg), Err(Error::ConfigError(_)));
    }

    #[test]
    fn nan_rows_fail_every_detector_without_panicking() {
        let mut ensemble = AnomalyEnsemble::from_config(&all_detectors()).unwrap();
        let rows = vec![vec![1.0, 2.0], vec![f64::NAN, 2.5], vec![1.5, 2.0], vec![100.0, 2.2], vec![1.2, 1.9]];
        assert_matches!(ensemble.run(&rows), Err(Error::EmptyEnsemble));
    }

    #[test]
    fn scoring_before_fit_is_empty() {
        let ensemble = AnomalyEnsemble::from_config(&all_detectors()).unwrap();
        assert_matches!(ensemble.score(&baseline()), Err(Error::EmptyEnsemble));
    }

    #[test]
    fn new_rows_are_scored_against_fitted_baselines() {
        let mut ensemble = AnomalyEnsemble::from_config(&all_detectors()).unwrap();
        assert_eq!(ensemble.fit(&baseline()).unwrap(), 3);

        let out = ensemble.score(&[vec![2.0, 3.0], vec![40.0, 3.0]]).unwrap();
        assert_eq!(out.members.len(), 3);
        assert_eq!(out.labels, vec![false, true]);
    }

    #[test]
    fn monitor_raises_alerts_for_flagged_rows() {
        let mut ensemble = AnomalyEnsemble::from_config(&all_detectors()).unwrap();
        ensemble.fit(&baseline()).unwrap();

        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let rows = vec![vec![2.0, 3.0], vec![1.0, 4.0], vec![40.0, 3.0]];
        let report = ensemble.monitor(&rows, at).unwrap();

        assert_eq!(report.alerts.len(), 1);
        let alert = &report.alerts[0];
        assert_eq!(alert.alert_id, "anomaly_20250102_030405_2");
        assert_eq!(alert.method, ENSEMBLE_ALERT_METHOD);
        assert_eq!(alert.values, vec![40.0, 3.0]);
        assert_eq!(alert.strength, report.result.scores[2]);
    }
}
