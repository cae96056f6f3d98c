use log::{debug, info};
use rayon::prelude::*;

use super::{restrict_weights, survivors};
use crate::config::ForecastConfig;
use crate::ensemble::{combine_forecast, EnsembleWeightMap, ForecastEnsembleResult};
use crate::forecasters::{
    LinearTrendForecaster, MovingAverageForecaster, ScoredForecaster, SeasonalNaiveForecaster,
};
use crate::utils::error::{Error, Result};
use crate::utils::series::{drop_outliers, forward_fill};

/// Runs every registered forecaster over the same history and combines the
/// forecasts by quality-weighted average.
pub struct ForecastEnsemble {
    forecasters: Vec<Box<dyn ScoredForecaster>>,
    weights: Option<EnsembleWeightMap>,
    horizon: usize,
    outlier_sigma: Option<f64>,
}

impl ForecastEnsemble {
    pub fn new(horizon: usize) -> Self {
        Self { forecasters: Vec::new(), weights: None, horizon, outlier_sigma: None }
    }

    /// Moving-average, linear-trend and seasonal-naive forecasters configured
    /// from the `[forecast]` section.
    pub fn from_config(cfg: &ForecastConfig) -> Result<Self> {
        let mut ensemble = Self::new(cfg.horizon)
            .with_forecaster(MovingAverageForecaster::new(cfg.moving_average_window, cfg.interval_level)?)
            .with_forecaster(LinearTrendForecaster::new(cfg.interval_level)?)
            .with_forecaster(SeasonalNaiveForecaster::new(cfg.seasonal_period, cfg.interval_level)?);
        ensemble.weights = cfg.weights.clone();
        ensemble.outlier_sigma = cfg.outlier_sigma;
        Ok(ensemble)
    }

    pub fn with_forecaster(mut self, forecaster: impl ScoredForecaster + 'static) -> Self {
        self.forecasters.push(Box::new(forecaster));
        self
    }

    pub fn with_weights(mut self, weights: EnsembleWeightMap) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Drop history points further than `sigma` standard deviations from the
    /// mean before forecasting.
    pub fn with_outlier_sigma(mut self, sigma: f64) -> Self {
        self.outlier_sigma = Some(sigma);
        self
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.forecasters.iter().map(|f| f.name()).collect()
    }

    /// Forecast `horizon` steps past `history` with every forecaster in
    /// parallel and combine.
    ///
    /// Forecasters that fail (for instance on too short a history) are
    /// dropped with a warning. If none succeed the call fails with
    /// [`Error::EmptyEnsemble`].
    pub fn run(&self, history: &[f64]) -> Result<ForecastEnsembleResult> {
        if self.horizon == 0 {
            return Err(Error::InvalidArgument("forecast horizon must be > 0".into()));
        }
        if self.forecasters.is_empty() {
            return Err(Error::EmptyEnsemble);
        }

        let cleaned;
        let history = match self.outlier_sigma {
            | Some(k) => {
                cleaned = drop_outliers(history, k);
                if cleaned.len() < history.len() {
                    debug!("dropped {} outliers beyond {} sigma", history.len() - cleaned.len(), k);
                }
                &cleaned[..]
            }
            | None => history,
        };
        debug!(
            "running {} forecasters over {} observations, horizon {}",
            self.forecasters.len(),
            history.len(),
            self.horizon
        );

        let outcomes: Vec<_> = self
            .forecasters
            .par_iter()
            .map(|f| (f.name().to_string(), f.forecast(history, self.horizon)))
            .collect();
        let results = survivors(outcomes, self.horizon);
        if results.is_empty() {
            return Err(Error::EmptyEnsemble);
        }
        if results.len() < self.forecasters.len() {
            info!("{} of {} forecasters contributed", results.len(), self.forecasters.len());
        }

        let weights = restrict_weights(self.weights.as_ref(), &results);
        combine_forecast(&results, weights.as_ref())
    }

    /// Like [`run`](Self::run), for a history with missing observations.
    /// Gaps are forward filled first.
    pub fn run_with_gaps(&self, raw: &[Option<f64>]) -> Result<ForecastEnsembleResult> {
        let history = forward_fill(raw);
        if history.is_empty() {
            return Err(Error::InvalidArgument("history has no observations".into()));
        }
        self.run(&history)
    }
}
