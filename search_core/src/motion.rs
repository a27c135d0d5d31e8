//! Motion model: start distribution and transition matrix over `N` hidden
//! motion states, plus the construction-time validation of every suggester
//! input.
//!
//! # Conventions
//! - `transition[(i, j)]` = P(state i → state j); rows sum to one.
//! - The model also keeps `Tᵀ`, so that `Tᵀ · u` advances a column
//!   distribution `u` by one step.
//! - Stochasticity is a caller precondition and is not checked.

use crate::{
    ensemble::Ensemble,
    error::{Result, ShapeError},
    types::{DMat, DVec, RawArray},
};
use gaussian_bank::GaussianBank;

#[derive(Clone, Debug)]
pub struct MotionModel {
    start: DVec,
    transition: DMat,
    transition_t: DMat,
}

impl MotionModel {
    /// Build a model from an already-cast start distribution and a square
    /// transition matrix of matching size.
    pub fn new(start: DVec, transition: DMat) -> std::result::Result<Self, ShapeError> {
        let n = start.len();
        if n == 0 || transition.nrows() != n || transition.ncols() != n {
            return Err(ShapeError::MotionCount {
                start: n,
                transition_rows: transition.nrows(),
                transition_cols: transition.ncols(),
                bank: n,
                sample_width: n,
            });
        }
        let transition_t = transition.transpose();
        Ok(Self {
            start,
            transition,
            transition_t,
        })
    }

    /// Number of motion states `N`.
    pub fn n_states(&self) -> usize {
        self.start.len()
    }

    pub fn start(&self) -> &DVec {
        &self.start
    }

    /// Row-stochastic transition matrix as supplied.
    pub fn transition(&self) -> &DMat {
        &self.transition
    }

    /// `Tᵀ`: entry `(i, j)` is the probability of arriving at `i` from `j`.
    pub fn transition_t(&self) -> &DMat {
        &self.transition_t
    }
}

/// Validate every suggester input and cast it to single precision.
///
/// Order of checks:
/// 1. ranks: start (1), transition (2), samples (2), densities (1)
/// 2. motion-state count `N` agrees across start, transition, bank and sample
///    width
/// 3. sample count `M` agrees between samples and densities
pub(crate) fn validate_inputs(
    start: &RawArray,
    transition: &RawArray,
    bank: &GaussianBank,
    samples: &RawArray,
    densities: &RawArray,
) -> Result<(MotionModel, Ensemble)> {
    let inputs = [
        (start, "start distribution", 1),
        (transition, "transition matrix", 2),
        (samples, "miss-probability samples", 2),
        (densities, "miss-probability densities", 1),
    ];
    for (array, name, rank) in inputs {
        array.check_rank(name, rank)?;
    }
    for (array, name, _) in inputs {
        array.check_len(name)?;
    }

    let n = start.dim(0);
    if n == 0
        || transition.dim(0) != n
        || transition.dim(1) != n
        || bank.len() != n
        || samples.dim(1) != n
    {
        return Err(ShapeError::MotionCount {
            start: n,
            transition_rows: transition.dim(0),
            transition_cols: transition.dim(1),
            bank: bank.len(),
            sample_width: samples.dim(1),
        }
        .into());
    }

    let m = samples.dim(0);
    if m == 0 || densities.dim(0) != m {
        return Err(ShapeError::SampleCount {
            samples: m,
            densities: densities.dim(0),
        }
        .into());
    }

    let motion = MotionModel::new(start.to_vector(), transition.to_matrix())?;
    let ensemble = Ensemble::new(samples.to_rows(), densities.to_vector().iter().copied().collect())?;
    Ok((motion, ensemble))
}
