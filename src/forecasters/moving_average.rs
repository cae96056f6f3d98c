use log::debug;
use ta::indicators::SimpleMovingAverage;
use ta::Next;

use super::{finish, interval_z, require_history, ScoredForecaster};
use crate::ensemble::MethodResult;
use crate::utils::error::{Error, Result};

/// Flat forecast at the mean of the last `window` observations.
///
/// Quality is the MAE of the one-step-ahead predictions made once the window
/// is full, i.e. `x[t]` against the mean of `x[t-window..t]`.
#[derive(Debug, Clone)]
pub struct MovingAverageForecaster {
    name: String,
    window: usize,
    z: f64,
}

impl MovingAverageForecaster {
    pub const DEFAULT_NAME: &'static str = "moving_average";

    pub fn new(window: usize, interval_level: f64) -> Result<Self> {
        if window == 0 {
            return Err(Error::InvalidArgument("moving average window must be > 0".into()));
        }
        Ok(Self { name: Self::DEFAULT_NAME.to_string(), window, z: interval_z(interval_level)? })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl ScoredForecaster for MovingAverageForecaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn forecast(&self, history: &[f64], horizon: usize) -> Result<MethodResult> {
        require_history(&self.name, history, self.window + 1)?;
        let mut sma = SimpleMovingAverage::new(self.window)
            .map_err(|e| Error::InvalidArgument(format!("{}: {:?}", self.name, e)))?;

        let mut residuals = Vec::with_capacity(history.len() - self.window);
        let mut level = 0.0;
        for (t, x) in history.iter().enumerate() {
            if t >= self.window {
                residuals.push(x - level);
            }
            level = sma.next(*x);
        }
        debug!("{}: level {:.4} after {} observations", self.name, level, history.len());
        Ok(finish(&self.name, vec![level; horizon], &residuals, self.z))
    }
}
