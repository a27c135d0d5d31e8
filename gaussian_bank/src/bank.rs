//! Gaussian bank: one position density per motion state.
//!
//! The bank is the observation side of the suggester. It is built once from
//! `N` (mean, covariance) pairs and queried with mixture weights that do not
//! need to sum to one.

use crate::{density::Gaussian, DMat, DVec, Real};
use thiserror::Error;

/// Errors raised while building or querying a [`GaussianBank`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BankError {
    #[error("bank needs as many covariances as means (means: {means}, covariances: {covariances})")]
    PairCount { means: usize, covariances: usize },

    #[error("mean of state {state} has dimension {got}, expected {expected}")]
    MeanDim {
        state: usize,
        expected: usize,
        got: usize,
    },

    #[error("covariance of state {state} is {rows}x{cols}, expected {dim}x{dim}")]
    CovarianceShape {
        state: usize,
        dim: usize,
        rows: usize,
        cols: usize,
    },

    #[error("covariance of state {state} has {got} entries, expected {expected}")]
    CovarianceLen {
        state: usize,
        expected: usize,
        got: usize,
    },

    #[error("covariance of state {state} is not positive definite")]
    NotPositiveDefinite { state: usize },

    #[error("query point has dimension {got}, bank positions have dimension {expected}")]
    PointDim { expected: usize, got: usize },

    #[error("got {got} mixture weights for {expected} states")]
    WeightCount { expected: usize, got: usize },
}

/// Per-state Gaussian position densities.
///
/// `Clone` deep-copies every mean and covariance, so a cloned bank never
/// shares storage with its source.
#[derive(Clone, Debug)]
pub struct GaussianBank {
    components: Vec<Gaussian>,
    dim: usize,
}

impl GaussianBank {
    /// Build a bank from per-state means and covariances.
    ///
    /// All means must share one dimension `D`; each covariance must be a
    /// positive definite `D×D` matrix.
    pub fn new(means: Vec<DVec>, covariances: Vec<DMat>) -> Result<Self, BankError> {
        if means.len() != covariances.len() {
            return Err(BankError::PairCount {
                means: means.len(),
                covariances: covariances.len(),
            });
        }
        let dim = means.first().map_or(0, |m| m.len());

        let components = means
            .into_iter()
            .zip(covariances)
            .enumerate()
            .map(|(state, (mean, cov))| {
                if mean.len() != dim {
                    return Err(BankError::MeanDim {
                        state,
                        expected: dim,
                        got: mean.len(),
                    });
                }
                Gaussian::new(state, mean, cov)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { components, dim })
    }

    /// Build a bank from row-major `f64` data, casting to [`Real`].
    pub fn from_f64(means: &[Vec<f64>], covariances: &[Vec<f64>]) -> Result<Self, BankError> {
        if means.len() != covariances.len() {
            return Err(BankError::PairCount {
                means: means.len(),
                covariances: covariances.len(),
            });
        }
        let means: Vec<DVec> = means
            .iter()
            .map(|m| DVec::from_iterator(m.len(), m.iter().map(|&v| v as Real)))
            .collect();
        let covariances = covariances
            .iter()
            .enumerate()
            .map(|(state, c)| {
                let dim = means[state].len();
                if c.len() != dim * dim {
                    return Err(BankError::CovarianceLen {
                        state,
                        expected: dim * dim,
                        got: c.len(),
                    });
                }
                Ok(DMat::from_row_iterator(dim, dim, c.iter().map(|&v| v as Real)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(means, covariances)
    }

    /// Number of motion states covered by the bank.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Dimension of the position space.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn components(&self) -> &[Gaussian] {
        &self.components
    }

    fn check_point(&self, x: &DVec) -> Result<(), BankError> {
        if x.len() != self.dim {
            return Err(BankError::PointDim {
                expected: self.dim,
                got: x.len(),
            });
        }
        Ok(())
    }

    /// Per-state densities `Nᵢ(x)`.
    pub fn densities(&self, x: &DVec) -> Result<DVec, BankError> {
        self.check_point(x)?;
        Ok(DVec::from_iterator(
            self.len(),
            self.components.iter().map(|g| g.pdf(x)),
        ))
    }

    /// Weighted mixture density `Σᵢ weights[i] · Nᵢ(x)`.
    ///
    /// The weights are used as given: no normalization is applied, so
    /// a weight vector summing to less than one yields a sub-probability
    /// density.
    pub fn weighted(&self, x: &DVec, weights: &DVec) -> Result<Real, BankError> {
        self.check_point(x)?;
        if weights.len() != self.len() {
            return Err(BankError::WeightCount {
                expected: self.len(),
                got: weights.len(),
            });
        }
        Ok(self
            .components
            .iter()
            .zip(weights.iter())
            .map(|(g, &w)| w * g.pdf(x))
            .sum())
    }
}
