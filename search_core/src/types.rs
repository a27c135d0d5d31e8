//! Fundamental types used across the crate.

use crate::error::ShapeError;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scalar type: every stored value is f32 after validation.
// ---------------------------------------------------------------------------

pub use gaussian_bank::{DMat, DVec, Real};

// ---------------------------------------------------------------------------
// RawArray — shaped input at the data-model boundary
// ---------------------------------------------------------------------------

/// A row-major `f64` array with an explicit shape.
///
/// Inputs loaded from JSON (or built by callers) carry their own rank, which is
/// checked before anything is stored. [`RawArray::to_vector`] and
/// [`RawArray::to_matrix`] are the only places values are narrowed to [`Real`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawArray {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl RawArray {
    /// Rank-1 array.
    pub fn vector(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Rank-2 array from row-major data.
    pub fn matrix(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        Self {
            shape: vec![rows, cols],
            data,
        }
    }

    /// Rank-2 array from nested rows. Ragged rows surface as a
    /// [`ShapeError::Data`] on the next [`RawArray::check`].
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        Self {
            shape: vec![rows.len(), cols],
            data: rows.iter().flatten().copied().collect(),
        }
    }

    pub fn from_vector(v: &DVec) -> Self {
        Self::vector(v.iter().map(|&x| f64::from(x)).collect())
    }

    pub fn from_matrix(m: &DMat) -> Self {
        // Column-major storage of mᵀ is the row-major order of m.
        let data = m.transpose().iter().map(|&x| f64::from(x)).collect();
        Self::matrix(m.nrows(), m.ncols(), data)
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Size along axis `axis`, or 0 if the array has fewer axes.
    pub fn dim(&self, axis: usize) -> usize {
        self.shape.get(axis).copied().unwrap_or(0)
    }

    /// Check that the array has rank `rank` and that its data fills its shape.
    pub fn check(&self, name: &'static str, rank: usize) -> Result<(), ShapeError> {
        self.check_rank(name, rank)?;
        self.check_len(name)
    }

    pub fn check_rank(&self, name: &'static str, rank: usize) -> Result<(), ShapeError> {
        if self.rank() != rank {
            return Err(ShapeError::Rank {
                name,
                expected: rank,
                shape: self.shape.clone(),
            });
        }
        Ok(())
    }

    /// Check that the data length equals the product of the shape. A product
    /// that overflows `usize` is reported as `expected == usize::MAX`.
    pub fn check_len(&self, name: &'static str) -> Result<(), ShapeError> {
        let expected = self
            .shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d));
        if expected != Some(self.data.len()) {
            return Err(ShapeError::Data {
                name,
                shape: self.shape.clone(),
                expected: expected.unwrap_or(usize::MAX),
                got: self.data.len(),
            });
        }
        Ok(())
    }

    /// Cast a checked rank-1 array.
    pub fn to_vector(&self) -> DVec {
        DVec::from_iterator(self.data.len(), self.data.iter().map(|&v| v as Real))
    }

    /// Cast a checked rank-2 array.
    pub fn to_matrix(&self) -> DMat {
        DMat::from_row_iterator(self.dim(0), self.dim(1), self.data.iter().map(|&v| v as Real))
    }

    /// Cast a checked rank-2 array into one vector per row.
    pub fn to_rows(&self) -> Vec<DVec> {
        let cols = self.dim(1);
        if cols == 0 {
            return vec![DVec::zeros(0); self.dim(0)];
        }
        self.data
            .chunks(cols)
            .map(|row| DVec::from_iterator(cols, row.iter().map(|&v| v as Real)))
            .collect()
    }
}
