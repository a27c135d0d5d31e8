//! Single multivariate Gaussian density.
//!
//! The covariance is factored once (Cholesky, `Σ = L·Lᵀ`) at construction so
//! that each evaluation costs one triangular solve:
//!
//! N(x) = (2π)^(-D/2) |Σ|^(-1/2) exp(-½ · ‖L⁻¹(x − μ)‖²)

use crate::{BankError, DMat, DVec, Real};
use nalgebra::Cholesky;

/// ln(2π)
const LN_2PI: Real = 1.837_877_1;

/// A Gaussian with a pre-factored covariance.
#[derive(Clone, Debug)]
pub struct Gaussian {
    mean: DVec,
    covariance: DMat,
    /// Lower Cholesky factor of `covariance`
    chol_l: DMat,
    /// −½·(D·ln 2π + ln|Σ|)
    log_norm: Real,
}

impl Gaussian {
    /// Build a density for `state`. Fails when the covariance is not square,
    /// disagrees with the mean's dimension, or is not positive definite.
    pub fn new(state: usize, mean: DVec, covariance: DMat) -> Result<Self, BankError> {
        let dim = mean.len();
        if covariance.nrows() != dim || covariance.ncols() != dim {
            return Err(BankError::CovarianceShape {
                state,
                dim,
                rows: covariance.nrows(),
                cols: covariance.ncols(),
            });
        }

        let chol = Cholesky::new(covariance.clone())
            .ok_or(BankError::NotPositiveDefinite { state })?;
        let chol_l = chol.l();

        // ln|Σ| = 2 · Σ ln Lᵢᵢ
        let log_det: Real = 2.0 * chol_l.diagonal().iter().map(|d| d.ln()).sum::<Real>();
        let log_norm = -0.5 * (dim as Real * LN_2PI + log_det);

        Ok(Self {
            mean,
            covariance,
            chol_l,
            log_norm,
        })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &DVec {
        &self.mean
    }

    pub fn covariance(&self) -> &DMat {
        &self.covariance
    }

    /// Squared Mahalanobis distance of `x` from the mean.
    /// The caller guarantees `x.len() == self.dim()`.
    fn mahalanobis_sq(&self, x: &DVec) -> Real {
        let diff = x - &self.mean;
        match self.chol_l.solve_lower_triangular(&diff) {
            Some(y) => y.norm_squared(),
            // The factor has a strictly positive diagonal, so this is unreachable
            // for a successfully constructed density.
            None => Real::INFINITY,
        }
    }

    /// Log density at `x`.
    pub fn log_pdf(&self, x: &DVec) -> Real {
        self.log_norm - 0.5 * self.mahalanobis_sq(x)
    }

    /// Density at `x`. Underflows to `0.0` far from the mean.
    pub fn pdf(&self, x: &DVec) -> Real {
        self.log_pdf(x).exp()
    }
}
