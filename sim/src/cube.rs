//! Uniform sampling inside an axis-aligned hyper-cube.
//!
//! Used to seed the miss-probability ensemble before any observation: with
//! unit densities, a uniform cube sample is a flat prior over `[low, high]^N`.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use search_core::RawArray;
use serde::{Deserialize, Serialize};

/// The cube `[low, high]^dim`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniformCube {
    pub low: f64,
    pub high: f64,
    pub dim: usize,
}

impl UniformCube {
    pub fn new(low: f64, high: f64, dim: usize) -> Self {
        Self { low, high, dim }
    }

    /// `[0, 1]^dim`
    pub fn unit(dim: usize) -> Self {
        Self::new(0.0, 1.0, dim)
    }

    /// Draw one point.
    pub fn point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let span = self.high - self.low;
        (0..self.dim)
            .map(|_| self.low + span * rng.gen::<f64>())
            .collect()
    }

    /// Draw `n` points as a `[n, dim]` array.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> RawArray {
        let data = (0..n).flat_map(|_| self.point(rng)).collect();
        RawArray::matrix(n, self.dim, data)
    }
}

/// Flat prior over miss probabilities: `n_samples` points of `[0, 1]^n_states`
/// with unit densities. Deterministic in `seed`.
pub fn uniform_ensemble(n_states: usize, n_samples: usize, seed: u64) -> (RawArray, RawArray) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let samples = UniformCube::unit(n_states).sample(&mut rng, n_samples);
    let densities = RawArray::vector(vec![1.0; n_samples]);
    (samples, densities)
}
