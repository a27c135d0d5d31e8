//! Miss-probability ensemble: the belief over the unknown per-state miss
//! probabilities.
//!
//! `M` fixed sample vectors (one miss probability per motion state) carry
//! mutable, unnormalized density weights. Expectations are importance-weighted
//! Monte Carlo sums divided by `M`:
//!
//! E[f] = (1/M) · Σᵢ densityᵢ · f(sampleᵢ)
//!
//! Per-sample values may be computed on the rayon pool; they are always
//! accumulated in sample order, so both paths return identical results.

use crate::{
    error::{Result, ShapeError},
    types::{DVec, Real},
};
use rayon::prelude::*;
use std::ops::{Add, Div, Mul};

#[derive(Clone, Debug)]
pub struct Ensemble {
    samples: Vec<DVec>,
    densities: Vec<Real>,
}

impl Ensemble {
    /// Pair `M ≥ 1` equally sized sample vectors with `M` densities.
    pub fn new(samples: Vec<DVec>, densities: Vec<Real>) -> std::result::Result<Self, ShapeError> {
        if samples.is_empty() || samples.len() != densities.len() {
            return Err(ShapeError::SampleCount {
                samples: samples.len(),
                densities: densities.len(),
            });
        }
        let width = samples[0].len();
        if let Some(bad) = samples.iter().find(|s| s.len() != width) {
            return Err(ShapeError::MissLen {
                expected: width,
                got: bad.len(),
            });
        }
        Ok(Self { samples, densities })
    }

    /// Number of samples `M`.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of each sample vector (the motion-state count).
    pub fn n_states(&self) -> usize {
        self.samples[0].len()
    }

    pub fn samples(&self) -> &[DVec] {
        &self.samples
    }

    pub fn densities(&self) -> &[Real] {
        &self.densities
    }

    pub fn total_density(&self) -> Real {
        self.densities.iter().sum()
    }

    /// Kish effective sample size `(Σd)² / Σd²`; `M` for uniform densities,
    /// close to 1 once the belief has collapsed onto one sample. NaN when any
    /// density is not finite.
    pub fn effective_sample_size(&self) -> Real {
        let sum_sq: Real = self.densities.iter().map(|d| d * d).sum();
        if !sum_sq.is_finite() {
            Real::NAN
        } else if sum_sq > 0.0 {
            let total = self.total_density();
            total * total / sum_sq
        } else {
            0.0
        }
    }

    /// Evaluate `f` on every sample, in sample order.
    pub fn map_samples<R, F>(&self, parallel: bool, f: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&DVec) -> Result<R> + Sync + Send,
    {
        if parallel {
            self.samples.par_iter().map(&f).collect()
        } else {
            self.samples.iter().map(&f).collect()
        }
    }

    /// Importance-weighted expectation of a scalar- or vector-valued `f`.
    pub fn expectation<R, F>(&self, parallel: bool, f: F) -> Result<R>
    where
        R: Send + Mul<Real, Output = R> + Add<Output = R> + Div<Real, Output = R>,
        F: Fn(&DVec) -> Result<R> + Sync + Send,
    {
        let values = self.map_samples(parallel, f)?;
        let mut weighted = values
            .into_iter()
            .zip(&self.densities)
            .map(|(v, &d)| v * d);
        let first = weighted.next().ok_or(ShapeError::SampleCount {
            samples: 0,
            densities: self.densities.len(),
        })?;
        let sum = weighted.fold(first, |acc, v| acc + v);
        Ok(sum / self.len() as Real)
    }

    /// Bayes step: `densityᵢ ← likelihoodᵢ · densityᵢ / normalizer`.
    ///
    /// Every density is divided by the same `normalizer`; a zero or non-finite
    /// value propagates into the densities unchanged.
    pub(crate) fn reweight(&mut self, likelihoods: &[Real], normalizer: Real) {
        debug_assert_eq!(likelihoods.len(), self.densities.len());
        for (d, &l) in self.densities.iter_mut().zip(likelihoods) {
            *d = l * *d;
        }
        for d in &mut self.densities {
            *d /= normalizer;
        }
    }

    /// Systematic resampling: redraw `M` samples proportionally to their
    /// densities and give every survivor the mean density, so the total
    /// density is preserved.
    ///
    /// Returns `false` (and leaves the ensemble untouched) when the total
    /// density is zero or not finite.
    #[cfg(feature = "resampling")]
    pub fn resample_systematic<G: rand::Rng + ?Sized>(&mut self, rng: &mut G) -> bool {
        let total = self.total_density();
        if !(total.is_finite() && total > 0.0) {
            return false;
        }
        let m = self.len();
        let step = total / m as Real;
        let u0 = rng.gen::<Real>() * step;

        let mut indices = Vec::with_capacity(m);
        let mut cumulative = self.densities[0];
        let mut j = 0;
        for i in 0..m {
            let threshold = u0 + i as Real * step;
            while cumulative <= threshold && j + 1 < m {
                j += 1;
                cumulative += self.densities[j];
            }
            indices.push(j);
        }

        // indices are non-decreasing
        let mut distinct = indices.clone();
        distinct.dedup();
        tracing::debug!(
            samples = m,
            distinct = distinct.len(),
            "resampled miss-probability ensemble"
        );

        self.samples = indices.iter().map(|&j| self.samples[j].clone()).collect();
        self.densities = vec![step; m];
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ensemble(samples: &[&[f32]], densities: &[f32]) -> Ensemble {
        Ensemble::new(
            samples.iter().map(|s| DVec::from_row_slice(s)).collect(),
            densities.to_vec(),
        )
        .unwrap()
    }

    #[test]
    fn constant_over_identical_samples_is_exact() {
        let e = ensemble(&[&[0.2, 0.4], &[0.2, 0.4]], &[1.0, 1.0]);
        for parallel in [false, true] {
            let c = e.expectation(parallel, |_| Ok(0.7_f32)).unwrap();
            assert_eq!(c, 0.7);
        }
    }

    #[test]
    fn unit_densities_scale_back_to_plain_sum() {
        let e = ensemble(&[&[0.1, 0.9], &[0.3, 0.5], &[0.6, 0.2]], &[1.0, 1.0, 1.0]);
        let f = |p: &DVec| -> Result<f32> { Ok(p[0] * 2.0 + p[1]) };
        let plain: f32 = e.samples().iter().map(|p| p[0] * 2.0 + p[1]).sum();
        let mean = e.expectation(false, f).unwrap();
        assert_abs_diff_eq!(mean * e.len() as f32, plain, epsilon = 1e-6);
    }

    #[test]
    fn vector_expectation_weights_each_sample() {
        let e = ensemble(&[&[1.0, 0.0], &[0.0, 1.0]], &[3.0, 1.0]);
        let v = e.expectation(false, |p| Ok(p.clone())).unwrap();
        assert_eq!(v.as_slice(), &[1.5, 0.5]);
    }

    #[test]
    fn parallel_matches_sequential() {
        let samples: Vec<Vec<f32>> = (0..64)
            .map(|i| vec![(i as f32 * 0.37).fract(), (i as f32 * 0.61).fract()])
            .collect();
        let refs: Vec<&[f32]> = samples.iter().map(|s| s.as_slice()).collect();
        let densities: Vec<f32> = (0..64).map(|i| 0.5 + (i % 7) as f32 * 0.1).collect();
        let e = ensemble(&refs, &densities);

        let f = |p: &DVec| -> Result<DVec> { Ok(p * 3.0) };
        assert_eq!(e.expectation(true, f).unwrap(), e.expectation(false, f).unwrap());
    }

    #[test]
    fn errors_from_f_propagate() {
        use crate::error::{NumericError, SuggestError};
        let e = ensemble(&[&[0.5]], &[1.0]);
        let err = e
            .expectation::<f32, _>(false, |_| Err(NumericError::SingularSystem.into()))
            .unwrap_err();
        assert_eq!(err, SuggestError::Numeric(NumericError::SingularSystem));
    }

    #[test]
    fn reweight_uses_one_divisor() {
        let mut e = ensemble(&[&[0.1], &[0.2], &[0.3]], &[1.0, 2.0, 4.0]);
        e.reweight(&[0.5, 0.25, 1.0], 2.0);
        assert_eq!(e.densities(), &[0.25, 0.25, 2.0]);
    }

    #[test]
    fn zero_normalizer_propagates_non_finite() {
        let mut e = ensemble(&[&[0.1], &[0.2]], &[1.0, 1.0]);
        e.reweight(&[0.0, 1.0], 0.0);
        assert!(e.densities()[0].is_nan());
        assert!(e.densities()[1].is_infinite());
    }

    #[test]
    fn effective_sample_size_bounds() {
        let uniform = ensemble(&[&[0.1], &[0.2], &[0.3], &[0.4]], &[2.0; 4]);
        assert_abs_diff_eq!(uniform.effective_sample_size(), 4.0, epsilon = 1e-6);
        let collapsed = ensemble(&[&[0.1], &[0.2], &[0.3], &[0.4]], &[0.0, 5.0, 0.0, 0.0]);
        assert_abs_diff_eq!(collapsed.effective_sample_size(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn effective_sample_size_is_nan_after_zero_normalizer() {
        let mut e = ensemble(&[&[0.1], &[0.2]], &[1.0, 1.0]);
        e.reweight(&[0.0, 1.0], 0.0);
        assert!(e.effective_sample_size().is_nan());
        let zero = ensemble(&[&[0.1], &[0.2]], &[0.0, 0.0]);
        assert_eq!(zero.effective_sample_size(), 0.0);
    }

    #[test]
    fn rejects_mismatched_construction() {
        let err = Ensemble::new(vec![DVec::zeros(2)], vec![1.0, 1.0]).unwrap_err();
        assert_eq!(err, ShapeError::SampleCount { samples: 1, densities: 2 });
        let err = Ensemble::new(vec![DVec::zeros(2), DVec::zeros(3)], vec![1.0, 1.0]).unwrap_err();
        assert_eq!(err, ShapeError::MissLen { expected: 2, got: 3 });
        assert!(Ensemble::new(vec![], vec![]).is_err());
    }

    #[cfg(feature = "resampling")]
    #[test]
    fn resampling_collapses_onto_dominant_sample() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        let mut e = ensemble(&[&[0.1], &[0.2], &[0.3], &[0.4]], &[0.0, 0.0, 5.0, 0.0]);
        assert!(e.resample_systematic(&mut rng));
        assert!(e.samples().iter().all(|s| s[0] == 0.3));
        assert_eq!(e.densities(), &[1.25; 4]);
    }

    #[cfg(feature = "resampling")]
    #[test]
    fn resampling_skips_degenerate_densities() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        let mut e = ensemble(&[&[0.1], &[0.2]], &[f32::NAN, 1.0]);
        assert!(!e.resample_systematic(&mut rng));
        assert_eq!(e.samples()[0][0], 0.1);
    }
}
