//! Weight solver: miss probabilities → expected per-state detection weights.
//!
//! The item walks the motion chain. Each move from state `j` into a different
//! state `i` is the moment the item can be lost, which happens with
//! probability `p[i]`. Splitting `Tᵀ` accordingly:
//!
//! ```text
//! L[i,j] = p[i] · Tᵀ[i,j]   (i ≠ j),   L[i,i] = 0     absorbing part
//! K      = Tᵀ − L                                     still-carried part
//! w      = L · (I − K)⁻¹ · start
//! ```
//!
//! `(I − K)⁻¹` is the fundamental matrix of the absorbing chain: it sums
//! `Kᵗ · start` over all steps `t`. `w[i]` is the probability that the item is
//! lost in state `i`. The weights sum to less than one when some mass is
//! never absorbed.

use crate::{
    error::{NumericError, Result, ShapeError},
    motion::MotionModel,
    types::{DMat, DVec, Real},
};

/// Split `Tᵀ` into the absorbing part `L` and the transient part `K`.
fn split_transitions(transition_t: &DMat, miss: &DVec) -> (DMat, DMat) {
    let n = transition_t.nrows();
    let l = DMat::from_fn(n, n, |i, j| {
        if i == j {
            0.0
        } else {
            miss[i] * transition_t[(i, j)]
        }
    });
    let k = transition_t - &l;
    (l, k)
}

/// Expected detection weights for one miss-probability vector.
///
/// An all-zero `L` (for example every `p[i] == 0`, or a single-state model)
/// gives the zero vector directly: nothing is ever absorbed, and `I − K` is
/// usually singular in that case.
pub fn detection_weights(motion: &MotionModel, miss: &DVec) -> Result<DVec> {
    let n = motion.n_states();
    if miss.len() != n {
        return Err(ShapeError::MissLen {
            expected: n,
            got: miss.len(),
        }
        .into());
    }

    let (l, k) = split_transitions(motion.transition_t(), miss);
    if l.iter().all(|&v| v == 0.0) {
        return Ok(DVec::zeros(n));
    }

    let system = DMat::identity(n, n) - k;
    let carried = system
        .lu()
        .solve(motion.start())
        .ok_or(NumericError::SingularSystem)?;
    Ok(l * carried)
}

/// Total absorbed mass `Σᵢ wᵢ`.
pub fn absorbed_mass(weights: &DVec) -> Real {
    weights.sum()
}
