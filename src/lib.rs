//! # Ensemble Combiner
//! Combines the outputs of several independent scoring methods into one
//! ensemble result.
//!
//! Two combinations are provided:
//! - [`combine_voting`]: weighted voting over per-item anomaly labels, with a
//!   weighted average of the raw scores alongside.
//! - [`combine_forecast`]: weighted average of point forecasts (and interval
//!   bounds), with weights derived from each method's error metric when none
//!   are given.
//!
//! The [`engine`] module drives a set of [`detectors`] or [`forecasters`] over
//! the same input and hands their results to the combiner.

pub use crate::utils::error::{Error, Result};

pub mod analysis;
pub mod config;
pub mod detectors;
pub mod engine;
pub mod ensemble;
pub mod forecasters;
pub mod synthetic;
pub mod utils;

pub use crate::config::Config;
pub use crate::engine::{AnomalyEnsemble, ForecastEnsemble, MonitorReport};
pub use crate::ensemble::{
    combine_forecast, combine_voting, EnsembleResult, EnsembleWeightMap, ForecastEnsembleResult, MethodResult,
};
