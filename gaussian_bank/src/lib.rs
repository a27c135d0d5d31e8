//! `gaussian_bank` — Per-state position densities for the lost-item suggester.
//!
//! Each motion state owns one multivariate Gaussian over item position.
//! The bank evaluates the unnormalized mixture `Σᵢ wᵢ · Nᵢ(x)`.

pub mod bank;
pub mod density;

pub use bank::{BankError, GaussianBank};
pub use density::Gaussian;

use nalgebra::{DMatrix, DVector};

/// All bank math is single precision.
pub type Real = f32;

pub type DVec = DVector<Real>;
pub type DMat = DMatrix<Real>;
