use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ensemble::MethodResult;

/// One flagged row from a scoring pass over new data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAlert {
    /// `anomaly_<YYYYmmdd_HHMMSS>_<row>`
    pub alert_id: String,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    /// Index of the flagged row in the scored batch
    pub row: usize,
    /// Anomaly score of the row
    pub strength: f64,
    /// Feature values of the row
    pub values: Vec<f64>,
}

impl AnomalyAlert {
    pub fn new(method: &str, row: usize, strength: f64, values: Vec<f64>, timestamp: DateTime<Utc>) -> Self {
        Self {
            alert_id: format!("anomaly_{}_{}", timestamp.format("%Y%m%d_%H%M%S"), row),
            timestamp,
            method: method.to_string(),
            row,
            strength,
            values,
        }
    }

    /// One alert per row `result` labels anomalous, in row order. `rows` is
    /// the batch that was scored.
    pub fn from_result(result: &MethodResult, rows: &[Vec<f64>], timestamp: DateTime<Utc>) -> Vec<Self> {
        Self::collect(&result.method_name, &result.scores, result.labels.as_deref().unwrap_or(&[]), rows, timestamp)
    }

    pub(crate) fn collect(
        method: &str, scores: &[f64], labels: &[bool], rows: &[Vec<f64>], timestamp: DateTime<Utc>,
    ) -> Vec<Self> {
        labels
            .iter()
            .enumerate()
            .filter(|(_, flagged)| **flagged)
            .map(|(i, _)| {
                let strength = scores.get(i).copied().unwrap_or(0.0);
                let values = rows.get(i).cloned().unwrap_or_default();
                Self::new(method, i, strength, values, timestamp)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn alerts_follow_labels() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let result = MethodResult::new("iqr", vec![0.0, 2.5, 0.0, 4.0]).with_labels(vec![false, true, false, true]);
        let rows = vec![vec![1.0], vec![9.0], vec![1.1], vec![12.0]];

        let alerts = AnomalyAlert::from_result(&result, &rows, at);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].row, 1);
        assert_eq!(alerts[0].strength, 2.5);
        assert_eq!(alerts[0].values, vec![9.0]);
        assert_eq!(alerts[1].alert_id, "anomaly_20240305_140709_3");
        assert_eq!(alerts[1].method, "iqr");
    }

    #[test]
    fn unlabelled_result_raises_nothing() {
        let result = MethodResult::new("ma", vec![1.0, 2.0]);
        assert!(AnomalyAlert::from_result(&result, &[], Utc::now()).is_empty());
    }
}
