//! Error taxonomy for the suggester.
//!
//! - [`ShapeError`]   — inconsistent input ranks or sizes, raised at construction
//! - [`NumericError`] — singular fundamental system, rejected normalizer
//! - [`BankError`]    — forwarded from the Gaussian bank

use crate::types::Real;
use gaussian_bank::BankError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("{name} must be {expected}-dimensional, its shape is {shape:?}")]
    Rank {
        name: &'static str,
        expected: usize,
        shape: Vec<usize>,
    },

    #[error("{name} has {got} values but shape {shape:?} needs {expected}")]
    Data {
        name: &'static str,
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },

    #[error(
        "cannot determine motion-state count: start distribution has {start} states, \
         transition matrix is {transition_rows}x{transition_cols}, bank has {bank} states, \
         miss-probability samples have {sample_width} columns"
    )]
    MotionCount {
        start: usize,
        transition_rows: usize,
        transition_cols: usize,
        bank: usize,
        sample_width: usize,
    },

    #[error("cannot determine sample count: {samples} miss-probability samples, {densities} densities")]
    SampleCount { samples: usize, densities: usize },

    #[error("miss-probability vector has {got} entries, expected {expected}")]
    MissLen { expected: usize, got: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericError {
    /// `I − K` has no inverse for this miss-probability vector.
    #[error("fundamental system I - K is singular")]
    SingularSystem,

    /// The marginal likelihood used to renormalize the ensemble is zero or
    /// not finite.
    #[error("marginal likelihood {value} cannot normalize the ensemble")]
    NonFiniteNormalizer { value: Real },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SuggestError {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Numeric(#[from] NumericError),
}

pub type Result<T> = std::result::Result<T, SuggestError>;
