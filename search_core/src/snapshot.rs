//! Snapshot: a plain serializable record of every suggester input.
//!
//! The same record is used to describe a fresh suggester (scenario files) and
//! to persist one between runs: densities hold the current belief.

use crate::{error::Result, types::RawArray};
use gaussian_bank::GaussianBank;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggesterSnapshot {
    /// Start distribution, shape `[N]`
    pub start: RawArray,
    /// Row-stochastic transition matrix, shape `[N, N]`
    pub transition: RawArray,
    /// Per-state position means, `N` vectors of length `D`
    pub means: Vec<Vec<f64>>,
    /// Per-state position covariances, `N` row-major `D×D` blocks
    pub covariances: Vec<Vec<f64>>,
    /// Miss-probability samples, shape `[M, N]`
    pub samples: RawArray,
    /// Sample densities, shape `[M]`
    pub densities: RawArray,
}

impl SuggesterSnapshot {
    /// Build the Gaussian bank described by `means` and `covariances`.
    pub fn bank(&self) -> Result<GaussianBank> {
        Ok(GaussianBank::from_f64(&self.means, &self.covariances)?)
    }
}
