//! Cleaning of raw feature rows before detection.
//!
//! Missing cells are encoded as `NaN`. They are dropped, linearly
//! interpolated or forward filled per feature column; any row still holding
//! a non-finite cell (including `±inf`) is then removed. Optionally the
//! surviving rows are standardised to zero mean and unit variance.

use log::info;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::check_width;
use crate::config::PreprocessConfig;
use crate::utils::error::{Error, Result};
use crate::utils::series::forward_fill;

/// How missing (`NaN`) cells are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValues {
    /// Remove every row with a missing cell
    Drop,
    /// Linear interpolation between neighbours in the same column; trailing
    /// gaps repeat the last value, leading gaps stay missing
    #[default]
    Interpolate,
    /// Carry the last value forward, then fill leading gaps backwards
    ForwardFill,
}

/// Per-feature mean and population standard deviation learned from one
/// batch and applied to others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl Standardizer {
    /// `rows` must be non-empty, rectangular and finite.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = super::columns("standardizer", rows)?;
        let means = cols.iter().map(|c| c.iter().mean()).collect();
        let stds = cols
            .iter()
            .map(|c| match c.iter().population_std_dev() {
                | s if s > 0.0 => s,
                | _ => 1.0,
            })
            .collect();
        Ok(Self { means, stds })
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        check_width("standardizer", rows, self.means.len())?;
        Ok(rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(&self.stds))
                    .map(|(x, (m, s))| (x - m) / s)
                    .collect()
            })
            .collect())
    }
}

/// Rows that survived preprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    pub rows: Vec<Vec<f64>>,
    /// Index in the input of each surviving row
    pub kept: Vec<usize>,
    /// Scaling applied to `rows`, reusable on later batches
    pub scaler: Option<Standardizer>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocessor {
    pub missing: MissingValues,
    pub standardize: bool,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self { missing: MissingValues::default(), standardize: true }
    }
}

impl Preprocessor {
    pub fn new(missing: MissingValues, standardize: bool) -> Self {
        Self { missing, standardize }
    }

    pub fn from_config(cfg: &PreprocessConfig) -> Self {
        Self::new(cfg.missing_values, cfg.standardize)
    }

    pub fn apply(&self, rows: &[Vec<f64>]) -> Result<Preprocessed> {
        let width = match rows.first() {
            | Some(r) if !r.is_empty() => r.len(),
            | _ => return Err(Error::InvalidArgument("preprocess: no rows or no features".into())),
        };
        if let Some(i) = rows.iter().position(|r| r.len() != width) {
            return Err(Error::InvalidArgument(format!(
                "preprocess: row {} has {} features, expected {}",
                i,
                rows[i].len(),
                width
            )));
        }

        let mut filled = rows.to_vec();
        match self.missing {
            | MissingValues::Drop => {}
            | MissingValues::Interpolate => {
                for j in 0..width {
                    let col: Vec<f64> = filled.iter().map(|r| r[j]).collect();
                    for (r, v) in filled.iter_mut().zip(interpolate(&col)) {
                        r[j] = v;
                    }
                }
            }
            | MissingValues::ForwardFill => {
                for j in 0..width {
                    let col: Vec<Option<f64>> =
                        filled.iter().map(|r| Some(r[j]).filter(|v| !v.is_nan())).collect();
                    // an all-missing column stays missing and its rows drop below
                    for (r, v) in filled.iter_mut().zip(forward_fill(&col)) {
                        r[j] = v;
                    }
                }
            }
        }

        let (kept, clean): (Vec<usize>, Vec<Vec<f64>>) = filled
            .into_iter()
            .enumerate()
            .filter(|(_, r)| r.iter().all(|v| v.is_finite()))
            .unzip();
        if clean.is_empty() {
            return Err(Error::InvalidArgument("preprocess: no complete rows left".into()));
        }

        let (rows_out, scaler) = if self.standardize {
            let scaler = Standardizer::fit(&clean)?;
            (scaler.transform(&clean)?, Some(scaler))
        } else {
            (clean, None)
        };
        info!("Data preprocessed: {} of {} rows kept, {} features", kept.len(), rows.len(), width);
        Ok(Preprocessed { rows: rows_out, kept, scaler })
    }
}

/// Linear interpolation over `NaN` gaps, by position.
fn interpolate(col: &[f64]) -> Vec<f64> {
    let mut out = col.to_vec();
    let mut prev: Option<usize> = None;
    for i in 0..col.len() {
        if col[i].is_nan() {
            continue;
        }
        if let Some(p) = prev {
            let span = (i - p) as f64;
            for k in p + 1..i {
                let t = (k - p) as f64 / span;
                out[k] = col[p] + t * (col[i] - col[p]);
            }
        }
        prev = Some(i);
    }
    if let Some(p) = prev {
        for v in out.iter_mut().skip(p + 1) {
            *v = col[p];
        }
    }
    out
}
