//! Small helpers for cleaning a numeric series before forecasting.

use statrs::statistics::Statistics;

/// Fill gaps with the most recent observation. Leading gaps take the first
/// observed value; an all-gap series yields an empty vector.
pub fn forward_fill(raw: &[Option<f64>]) -> Vec<f64> {
    let first = match raw.iter().flatten().next() {
        | Some(v) => *v,
        | None => return Vec::new(),
    };
    let mut last = first;
    raw.iter()
        .map(|v| {
            if let Some(v) = v {
                last = *v;
            }
            last
        })
        .collect()
}

/// Drop points further than `k` sample standard deviations from the mean.
pub fn drop_outliers(values: &[f64], k: f64) -> Vec<f64> {
    if values.len() < 2 {
        return values.to_vec();
    }
    let mean = values.iter().mean();
    let std = values.iter().std_dev();
    if !std.is_finite() || std == 0.0 {
        return values.to_vec();
    }
    values.iter().copied().filter(|x| (x - mean).abs() <= k * std).collect()
}

/// Mean absolute difference between two equally long slices.
pub(crate) fn mean_abs_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum::<f64>() / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_fill_carries_last_value_and_backfills_head() {
        let raw = [None, Some(2.0), None, None, Some(5.0), None];
        assert_eq!(forward_fill(&raw), vec![2.0, 2.0, 2.0, 2.0, 5.0, 5.0]);
    }

    #[test]
    fn forward_fill_all_missing_is_empty() {
        assert!(forward_fill(&[None, None]).is_empty());
    }

    #[test]
    fn drop_outliers_removes_spike() {
        let mut values = vec![10.0; 30];
        values.push(1_000.0);
        let cleaned = drop_outliers(&values, 3.0);
        assert_eq!(cleaned.len(), 30);
        assert!(cleaned.iter().all(|v| *v == 10.0));
    }

    #[test]
    fn drop_outliers_keeps_constant_series() {
        let values = vec![4.0; 5];
        assert_eq!(drop_outliers(&values, 3.0), values);
    }
}
