//! Scored anomaly detectors.
//!
//! Every detector learns baseline statistics from a feature matrix (one
//! `Vec<f64>` per row) with [`ScoredDetector::fit`] and then turns any matrix
//! of the same width into a [`MethodResult`] carrying a per-row anomaly score
//! and label. The anomaly ensemble iterates over `Box<dyn ScoredDetector>`
//! instead of dispatching on method names.

mod alert;
mod mahalanobis;
pub mod preprocess;
mod statistical;

pub use alert::AnomalyAlert;
pub use mahalanobis::MahalanobisDetector;
pub use preprocess::{MissingValues, Preprocessed, Preprocessor, Standardizer};
pub use statistical::{IqrDetector, ZScoreDetector};

use crate::ensemble::MethodResult;
use crate::utils::error::{Error, Result};

/// A detector that scores and labels every row of a feature matrix.
pub trait ScoredDetector: Send + Sync {
    /// Method name used as the key in ensemble weight maps.
    fn name(&self) -> &str;

    /// Learn baseline statistics from `rows`, replacing any earlier baseline.
    fn fit(&mut self, rows: &[Vec<f64>]) -> Result<()>;

    /// Score `rows` against the fitted baseline. The result has exactly
    /// `rows.len()` scores and labels. Fails with [`Error::NotFitted`] before
    /// [`fit`](Self::fit).
    fn score(&self, rows: &[Vec<f64>]) -> Result<MethodResult>;

    fn is_fitted(&self) -> bool;

    /// Fit on `rows` and score the same rows.
    fn detect(&mut self, rows: &[Vec<f64>]) -> Result<MethodResult> {
        self.fit(rows)?;
        self.score(rows)
    }
}

/// Check that `rows` is non-empty, rectangular and finite; returns the width.
pub(crate) fn check_rows(method: &str, rows: &[Vec<f64>]) -> Result<usize> {
    let width = match rows.first() {
        | Some(r) if !r.is_empty() => r.len(),
        | _ => {
            return Err(Error::InvalidArgument(format!(
                "{}: feature matrix must have at least one row and one column",
                method
            )))
        }
    };
    for (i, r) in rows.iter().enumerate() {
        if r.len() != width {
            return Err(Error::InvalidArgument(format!(
                "{}: row {} has {} features, expected {}",
                method,
                i,
                r.len(),
                width
            )));
        }
        if let Some(j) = r.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "{}: row {} feature {} is not finite ({})",
                method, i, j, r[j]
            )));
        }
    }
    Ok(width)
}

/// Like [`check_rows`], additionally requiring the width of the fitted baseline.
pub(crate) fn check_width(method: &str, rows: &[Vec<f64>], expected: usize) -> Result<()> {
    let width = check_rows(method, rows)?;
    if width != expected {
        return Err(Error::InvalidArgument(format!(
            "{}: rows have {} features, baseline has {}",
            method, width, expected
        )));
    }
    Ok(())
}

/// Transpose a checked row matrix into feature columns.
pub(crate) fn columns(method: &str, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let width = check_rows(method, rows)?;
    Ok((0..width).map(|j| rows.iter().map(|r| r[j]).collect()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn columns_transposes() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        assert_eq!(columns("t", &rows).unwrap(), vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]]);
    }

    #[test]
    fn columns_rejects_ragged_and_empty() {
        assert_matches!(columns("t", &[]), Err(Error::InvalidArgument(_)));
        assert_matches!(columns("t", &[vec![]]), Err(Error::InvalidArgument(_)));
        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert_matches!(columns("t", &ragged), Err(Error::InvalidArgument(msg)) if msg.contains("row 1"));
    }

    #[test]
    fn non_finite_cells_are_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![f64::NAN, 4.0]];
        assert_matches!(
            check_rows("t", &rows),
            Err(Error::InvalidArgument(msg)) if msg.contains("row 1 feature 0")
        );
        let rows = vec![vec![1.0, f64::NEG_INFINITY]];
        assert_matches!(check_rows("t", &rows), Err(Error::InvalidArgument(_)));
    }

    #[test]
    fn width_must_match_baseline() {
        let rows = vec![vec![1.0, 2.0]];
        assert!(check_width("t", &rows, 2).is_ok());
        assert_matches!(check_width("t", &rows, 3), Err(Error::InvalidArgument(_)));
    }
}
