//! Utility functions and types for the ensemble combiner.

pub mod error;
pub(crate) mod logging;
pub mod series;

pub use error::{Error, Result};
pub use logging::init_logging;
