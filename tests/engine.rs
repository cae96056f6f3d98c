use ensemble_combiner::analysis::{DetectionMetrics, ForecastAccuracy};
use chrono::Utc;
use ensemble_combiner::config::Config;
use ensemble_combiner::detectors::Preprocessor;
use ensemble_combiner::synthetic::{anomaly_dataset, cost_series};
use ensemble_combiner::{AnomalyEnsemble, ForecastEnsemble};

#[test]
fn statistical_detectors_find_injected_anomalies() {
    let cfg = Config::default();
    let data = anomaly_dataset(&cfg.synthetic).unwrap();

    let mut ensemble = AnomalyEnsemble::from_config(&cfg.voting).unwrap();
    let out = ensemble.run(&data.rows).unwrap();

    assert_eq!(out.labels.len(), data.rows.len());
    assert_eq!(out.members.len(), 2);
    assert_eq!(out.weights["z_score"], 0.5);
    assert_eq!(out.weights["iqr"], 0.5);

    let metrics = DetectionMetrics::evaluate(&out.labels, &data.truth).unwrap();
    assert!(metrics.recall > 0.6, "recall {}", metrics.recall);
    assert!(metrics.precision > 0.6, "precision {}", metrics.precision);
    assert!(metrics.accuracy > 0.9, "accuracy {}", metrics.accuracy);
}

#[test]
fn same_seed_same_ensemble_labels() {
    let cfg = Config::default();
    let mut ensemble = AnomalyEnsemble::from_config(&cfg.voting).unwrap();
    let a = ensemble.run(&anomaly_dataset(&cfg.synthetic).unwrap().rows).unwrap();
    let b = ensemble.run(&anomaly_dataset(&cfg.synthetic).unwrap().rows).unwrap();
    assert_eq!(a.labels, b.labels);
    assert_eq!(a.scores, b.scores);
}

#[test]
fn baseline_then_monitor_new_batch() {
    let mut cfg = Config::default();
    cfg.voting.detectors = vec!["z_score".into(), "iqr".into(), "mahalanobis".into()];
    let data = anomaly_dataset(&cfg.synthetic).unwrap();
    let (history, batch) = data.rows.split_at(data.rows.len() / 2);

    let clean: Vec<Vec<f64>> = history
        .iter()
        .zip(&data.truth)
        .filter(|(_, anomalous)| !**anomalous)
        .map(|(row, _)| row.clone())
        .collect();
    let prepared = Preprocessor::from_config(&cfg.preprocess).apply(&clean).unwrap();
    let scaler = prepared.scaler.unwrap();

    let mut ensemble = AnomalyEnsemble::from_config(&cfg.voting).unwrap();
    assert_eq!(ensemble.fit(&prepared.rows).unwrap(), 3);

    let report = ensemble.monitor(&scaler.transform(batch).unwrap(), Utc::now()).unwrap();
    let truth = &data.truth[history.len()..];
    let caught = report.alerts.iter().filter(|a| truth[a.row]).count();
    assert_eq!(report.alerts.len(), report.result.anomaly_count);
    assert!(caught * 10 >= truth.iter().filter(|t| **t).count() * 6, "caught {}", caught);
}

#[test]
fn forecast_ensemble_tracks_held_out_costs() {
    let cfg = Config::default();
    let series = cost_series(&cfg.synthetic).unwrap();
    let (train, test) = series.split_tail(cfg.forecast.horizon);

    let ensemble = ForecastEnsemble::from_config(&cfg.forecast).unwrap();
    let out = ensemble.run(&train.values).unwrap();

    assert_eq!(out.horizon(), test.len());
    assert_eq!(out.members.len(), 3);
    assert!(!out.used_fallback_weights);
    assert!((out.weights.values().sum::<f64>() - 1.0).abs() < 1e-9);

    let lower = out.lower.as_ref().unwrap();
    let upper = out.upper.as_ref().unwrap();
    for i in 0..out.horizon() {
        assert!(lower[i] <= out.forecast[i] && out.forecast[i] <= upper[i]);
    }

    let accuracy = ForecastAccuracy::evaluate(&test.values, &out.forecast).unwrap();
    assert!(accuracy.mape < 25.0, "mape {}", accuracy.mape);
}

#[test]
fn gappy_history_still_forecasts() {
    let cfg = Config::default();
    let series = cost_series(&cfg.synthetic).unwrap();
    let raw: Vec<Option<f64>> = series
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| if i % 10 == 3 { None } else { Some(*v) })
        .collect();

    let ensemble = ForecastEnsemble::from_config(&cfg.forecast).unwrap();
    let out = ensemble.run_with_gaps(&raw).unwrap();
    assert_eq!(out.forecast.len(), cfg.forecast.horizon);
    assert!(out.forecast.iter().all(|v| v.is_finite()));
}
