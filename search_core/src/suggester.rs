//! Suggester: predictive search density and Bayesian belief update.
//!
//! # Operations
//! - [`Suggester::suggest`] — density of finding the item at `x`, marginalized
//!   over the miss-probability ensemble:
//!   `bank.weighted(x, E[weights(p)])`
//! - [`Suggester::update`] — reweight every ensemble sample by its own
//!   likelihood at `x`, normalized by `suggest(x)` evaluated before the update.

use crate::{
    ensemble::Ensemble,
    error::{NumericError, Result, SuggestError},
    motion::{validate_inputs, MotionModel},
    snapshot::SuggesterSnapshot,
    types::{DVec, RawArray, Real},
    weight::detection_weights,
};
use gaussian_bank::GaussianBank;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// What `update` does when the marginal likelihood is zero or not finite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonFinitePolicy {
    /// Divide anyway; densities become `inf`/`NaN`.
    #[default]
    Propagate,
    /// Return [`NumericError::NonFiniteNormalizer`] and keep the densities.
    Reject,
}

/// Configuration for the suggester.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggesterConfig {
    /// Evaluate per-sample weights and likelihoods on the rayon pool.
    /// Results are identical to the sequential path.
    pub parallel: bool,
    /// Handling of a degenerate normalizer in `update`.
    pub non_finite: NonFinitePolicy,
}

impl Default for SuggesterConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            non_finite: NonFinitePolicy::Propagate,
        }
    }
}

// ---------------------------------------------------------------------------
// Suggester
// ---------------------------------------------------------------------------

/// Lost-item position estimator.
#[derive(Clone, Debug)]
pub struct Suggester {
    pub config: SuggesterConfig,
    motion: MotionModel,
    bank: GaussianBank,
    ensemble: Ensemble,
}

impl Suggester {
    /// Validate and store the inputs.
    ///
    /// The bank is cloned; the suggester never shares storage with the
    /// caller's arrays.
    pub fn new(
        start: &RawArray,
        transition: &RawArray,
        bank: &GaussianBank,
        samples: &RawArray,
        densities: &RawArray,
        config: SuggesterConfig,
    ) -> Result<Self> {
        let (motion, ensemble) = validate_inputs(start, transition, bank, samples, densities)?;
        debug!(
            states = motion.n_states(),
            samples = ensemble.len(),
            position_dim = bank.dim(),
            "suggester constructed"
        );
        Ok(Self {
            config,
            motion,
            bank: bank.clone(),
            ensemble,
        })
    }

    /// Rebuild a suggester from a persisted or hand-written record.
    pub fn from_snapshot(snapshot: &SuggesterSnapshot, config: SuggesterConfig) -> Result<Self> {
        let bank = snapshot.bank()?;
        Self::new(
            &snapshot.start,
            &snapshot.transition,
            &bank,
            &snapshot.samples,
            &snapshot.densities,
            config,
        )
    }

    /// Record of the current state, densities included.
    pub fn snapshot(&self) -> SuggesterSnapshot {
        let components = self.bank.components();
        SuggesterSnapshot {
            start: RawArray::from_vector(self.motion.start()),
            transition: RawArray::from_matrix(self.motion.transition()),
            means: components
                .iter()
                .map(|g| g.mean().iter().map(|&v| f64::from(v)).collect())
                .collect(),
            covariances: components
                .iter()
                .map(|g| RawArray::from_matrix(g.covariance()).data)
                .collect(),
            samples: RawArray::matrix(
                self.ensemble.len(),
                self.ensemble.n_states(),
                self.ensemble
                    .samples()
                    .iter()
                    .flat_map(|s| s.iter().map(|&v| f64::from(v)))
                    .collect(),
            ),
            densities: RawArray::vector(
                self.ensemble.densities().iter().map(|&d| f64::from(d)).collect(),
            ),
        }
    }

    pub fn n_states(&self) -> usize {
        self.motion.n_states()
    }

    pub fn n_samples(&self) -> usize {
        self.ensemble.len()
    }

    pub fn motion(&self) -> &MotionModel {
        &self.motion
    }

    pub fn bank(&self) -> &GaussianBank {
        &self.bank
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Mutable ensemble access, for explicit resampling between updates.
    #[cfg(feature = "resampling")]
    pub fn ensemble_mut(&mut self) -> &mut Ensemble {
        &mut self.ensemble
    }

    /// Detection weights for one miss-probability vector.
    pub fn weight(&self, miss: &DVec) -> Result<DVec> {
        detection_weights(&self.motion, miss)
    }

    /// Unnormalized mixture density at `x` for one miss-probability vector.
    pub fn likelihood(&self, x: &DVec, miss: &DVec) -> Result<Real> {
        let w = self.weight(miss)?;
        Ok(self.bank.weighted(x, &w)?)
    }

    /// Ensemble-marginalized weights `E[weights(p)]`.
    pub fn expected_weights(&self) -> Result<DVec> {
        self.ensemble
            .expectation(self.config.parallel, |p| self.weight(p))
    }

    /// Self-normalized posterior mean of the miss probabilities,
    /// `E[p] / E[1]`.
    pub fn posterior_mean_miss(&self) -> Result<DVec> {
        let parallel = self.config.parallel;
        let weighted: DVec = self.ensemble.expectation(parallel, |p| Ok(p.clone()))?;
        let mass: Real = self.ensemble.expectation(parallel, |_| Ok(1.0))?;
        Ok(weighted / mass)
    }

    /// Predictive density of finding the item near `x`. Pure.
    pub fn suggest(&self, x: &DVec) -> Result<Real> {
        let w = self.expected_weights()?;
        Ok(self.bank.weighted(x, &w)?)
    }

    /// `suggest` over many points, sharing one marginalization.
    pub fn suggest_many(&self, xs: &[DVec]) -> Result<Vec<Real>> {
        let w = self.expected_weights()?;
        xs.iter()
            .map(|x| self.bank.weighted(x, &w).map_err(SuggestError::from))
            .collect()
    }

    /// Index and density of the most promising point in `xs`.
    /// `None` for an empty slice; `NaN` densities never win.
    pub fn best_of(&self, xs: &[DVec]) -> Result<Option<(usize, Real)>> {
        let densities = self.suggest_many(xs)?;
        Ok(densities
            .into_iter()
            .enumerate()
            .filter(|(_, d)| !d.is_nan())
            .fold(None, |best: Option<(usize, Real)>, (i, d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((i, d)),
            }))
    }

    /// Incorporate one observation at `x`. Returns the marginal likelihood
    /// used as normalizer.
    pub fn update(&mut self, x: &DVec) -> Result<Real> {
        let expected = self.suggest(x)?;

        if !expected.is_finite() || expected == 0.0 {
            match self.config.non_finite {
                NonFinitePolicy::Reject => {
                    warn!(expected, "rejecting update with degenerate marginal likelihood");
                    return Err(NumericError::NonFiniteNormalizer { value: expected }.into());
                }
                NonFinitePolicy::Propagate => {
                    warn!(expected, "degenerate marginal likelihood, densities become non-finite");
                }
            }
        }

        let likelihoods = self
            .ensemble
            .map_samples(self.config.parallel, |p| self.likelihood(x, p))?;
        for (i, l) in likelihoods.iter().enumerate() {
            trace!(sample = i, likelihood = l, "sample likelihood");
        }

        self.ensemble.reweight(&likelihoods, expected);
        debug!(
            expected,
            ess = self.ensemble.effective_sample_size(),
            total_density = self.ensemble.total_density(),
            "ensemble updated"
        );
        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ShapeError, SuggestError};
    use approx::assert_abs_diff_eq;
    use gaussian_bank::DMat;

    /// State 0 around the origin, state 1 ten units east.
    fn two_state_bank() -> GaussianBank {
        GaussianBank::new(
            vec![DVec::from_vec(vec![0.0, 0.0]), DVec::from_vec(vec![10.0, 0.0])],
            vec![DMat::identity(2, 2), DMat::identity(2, 2)],
        )
        .unwrap()
    }

    /// Symmetric two-state chain that always starts in state 0.
    fn suggester(samples: &[Vec<f64>], densities: Vec<f64>, config: SuggesterConfig) -> Suggester {
        Suggester::new(
            &RawArray::vector(vec![1.0, 0.0]),
            &RawArray::matrix(2, 2, vec![0.5, 0.5, 0.5, 0.5]),
            &two_state_bank(),
            &RawArray::from_rows(samples),
            &RawArray::vector(densities),
            config,
        )
        .unwrap()
    }

    fn origin() -> DVec {
        DVec::from_vec(vec![0.0, 0.0])
    }

    #[test]
    fn mismatched_inputs_create_no_suggester() {
        let err = Suggester::new(
            &RawArray::vector(vec![1.0, 0.0]),
            &RawArray::matrix(1, 2, vec![0.5, 0.5]),
            &two_state_bank(),
            &RawArray::from_rows(&[vec![0.5, 0.5]]),
            &RawArray::vector(vec![1.0]),
            SuggesterConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SuggestError::Shape(ShapeError::MotionCount { .. })));

        let err = Suggester::new(
            &RawArray::vector(vec![1.0, 0.0]),
            &RawArray::matrix(2, 2, vec![0.5, 0.5, 0.5, 0.5]),
            &two_state_bank(),
            &RawArray::from_rows(&[vec![0.5, 0.5, 0.5]]),
            &RawArray::vector(vec![1.0]),
            SuggesterConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SuggestError::Shape(ShapeError::MotionCount { sample_width: 3, .. })
        ));
    }

    #[test]
    fn suggest_is_pure() {
        let s = suggester(
            &[vec![0.5, 0.5], vec![0.2, 0.8]],
            vec![1.0, 0.5],
            SuggesterConfig::default(),
        );
        let x = DVec::from_vec(vec![1.0, 0.5]);
        let first = s.suggest(&x).unwrap();
        let second = s.suggest(&x).unwrap();
        assert_eq!(first, second);
        assert_eq!(s.ensemble().densities(), &[1.0, 0.5]);
    }

    #[test]
    fn suggest_is_mean_weighted_likelihood() {
        let samples = [vec![0.5, 0.5], vec![0.2, 0.8], vec![0.9, 0.1]];
        let s = suggester(&samples, vec![1.0, 2.0, 0.5], SuggesterConfig::default());
        let x = DVec::from_vec(vec![3.0, 1.0]);

        let by_sample: f32 = s
            .ensemble()
            .samples()
            .iter()
            .zip(s.ensemble().densities())
            .map(|(p, &d)| d * s.likelihood(&x, p).unwrap())
            .sum::<f32>()
            / 3.0;
        assert_abs_diff_eq!(s.suggest(&x).unwrap(), by_sample, epsilon = 1e-7);
    }

    #[test]
    fn symmetric_chain_weights_through_suggester() {
        let s = suggester(&[vec![0.5, 0.5]], vec![1.0], SuggesterConfig::default());
        let w = s.expected_weights().unwrap();
        assert_abs_diff_eq!(w[0], 1.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(w[1], 2.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn single_state_model_has_nothing_to_suggest() {
        let bank = GaussianBank::new(vec![DVec::zeros(1)], vec![DMat::identity(1, 1)]).unwrap();
        let s = Suggester::new(
            &RawArray::vector(vec![1.0]),
            &RawArray::matrix(1, 1, vec![1.0]),
            &bank,
            &RawArray::from_rows(&[vec![0.3], vec![0.9]]),
            &RawArray::vector(vec![1.0, 1.0]),
            SuggesterConfig::default(),
        )
        .unwrap();
        assert_eq!(s.weight(&DVec::from_vec(vec![0.3])).unwrap().as_slice(), &[0.0]);
        assert_eq!(s.suggest(&DVec::zeros(1)).unwrap(), 0.0);
    }

    #[test]
    fn zero_miss_sample_has_zero_likelihood() {
        let s = suggester(&[vec![0.0, 0.0]], vec![1.0], SuggesterConfig::default());
        assert_eq!(s.weight(&DVec::zeros(2)).unwrap(), DVec::zeros(2));
        assert_eq!(s.likelihood(&origin(), &DVec::zeros(2)).unwrap(), 0.0);
    }

    #[test]
    fn single_sample_update_keeps_unit_density() {
        let mut s = suggester(&[vec![0.5, 0.5]], vec![1.0], SuggesterConfig::default());
        let x = origin();
        let p = s.ensemble().samples()[0].clone();

        let expected = s.update(&x).unwrap();
        assert_eq!(expected, s.likelihood(&x, &p).unwrap());
        assert_eq!(s.ensemble().densities(), &[1.0]);

        s.update(&x).unwrap();
        assert_eq!(s.ensemble().densities(), &[1.0]);
    }

    #[test]
    fn update_keeps_mean_density_at_one() {
        let samples = [vec![0.5, 0.5], vec![0.2, 0.8], vec![0.9, 0.1]];
        let mut s = suggester(&samples, vec![2.0, 2.0, 2.0], SuggesterConfig::default());
        s.update(&DVec::from_vec(vec![2.0, 0.0])).unwrap();
        assert_abs_diff_eq!(s.ensemble().total_density(), 3.0, epsilon = 1e-4);
        s.update(&DVec::from_vec(vec![9.0, 1.0])).unwrap();
        assert_abs_diff_eq!(s.ensemble().total_density(), 3.0, epsilon = 1e-4);
    }

    #[test]
    fn update_favours_consistent_hypothesis() {
        // p = ½ puts a third of the mass in state 0; p = 1 puts none there.
        let mut s = suggester(
            &[vec![0.5, 0.5], vec![1.0, 1.0]],
            vec![1.0, 1.0],
            SuggesterConfig::default(),
        );
        s.update(&origin()).unwrap();
        let d = s.ensemble().densities();
        assert!(d[0] > d[1], "densities {d:?}");
        assert!(s.ensemble().effective_sample_size() < 1.01);

        let mean = s.posterior_mean_miss().unwrap();
        assert_abs_diff_eq!(mean[0], 0.5, epsilon = 1e-3);
        assert_abs_diff_eq!(mean[1], 0.5, epsilon = 1e-3);
    }

    #[test]
    fn zero_normalizer_propagates_by_default() {
        let mut s = suggester(
            &[vec![0.0, 0.0], vec![0.0, 0.0]],
            vec![1.0, 1.0],
            SuggesterConfig::default(),
        );
        let expected = s.update(&origin()).unwrap();
        assert_eq!(expected, 0.0);
        assert!(s.ensemble().densities().iter().all(|d| d.is_nan()));
    }

    #[test]
    fn zero_normalizer_can_be_rejected() {
        let config = SuggesterConfig {
            non_finite: NonFinitePolicy::Reject,
            ..SuggesterConfig::default()
        };
        let mut s = suggester(&[vec![0.0, 0.0], vec![0.0, 0.0]], vec![1.0, 1.0], config);
        let err = s.update(&origin()).unwrap_err();
        assert_eq!(
            err,
            SuggestError::Numeric(NumericError::NonFiniteNormalizer { value: 0.0 })
        );
        assert_eq!(s.ensemble().densities(), &[1.0, 1.0]);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let samples: Vec<Vec<f64>> = (0..32)
            .map(|i| vec![0.05 + 0.9 * (i as f64 / 31.0), 0.95 - 0.9 * (i as f64 / 31.0)])
            .collect();
        let mut par = suggester(&samples, vec![1.0; 32], SuggesterConfig::default());
        let mut seq = suggester(
            &samples,
            vec![1.0; 32],
            SuggesterConfig {
                parallel: false,
                ..SuggesterConfig::default()
            },
        );
        for x in [origin(), DVec::from_vec(vec![8.0, 1.0]), DVec::from_vec(vec![1.0, -1.0])] {
            assert_eq!(par.suggest(&x).unwrap(), seq.suggest(&x).unwrap());
            par.update(&x).unwrap();
            seq.update(&x).unwrap();
        }
        assert_eq!(par.ensemble().densities(), seq.ensemble().densities());
    }

    #[test]
    fn best_of_prefers_heavier_state() {
        let s = suggester(&[vec![0.5, 0.5]], vec![1.0], SuggesterConfig::default());
        let points = vec![origin(), DVec::from_vec(vec![10.0, 0.0])];
        let (best, density) = s.best_of(&points).unwrap().unwrap();
        assert_eq!(best, 1);
        assert_eq!(density, s.suggest(&points[1]).unwrap());
        assert_eq!(s.best_of(&[]).unwrap(), None);
    }

    #[test]
    fn suggest_many_matches_suggest() {
        let s = suggester(&[vec![0.5, 0.5], vec![0.3, 0.6]], vec![1.0, 3.0], SuggesterConfig::default());
        let points = vec![origin(), DVec::from_vec(vec![4.0, 2.0])];
        let many = s.suggest_many(&points).unwrap();
        assert_eq!(many[0], s.suggest(&points[0]).unwrap());
        assert_eq!(many[1], s.suggest(&points[1]).unwrap());
    }

    #[test]
    fn wrong_point_dimension_is_reported() {
        let mut s = suggester(&[vec![0.5, 0.5]], vec![1.0], SuggesterConfig::default());
        let err = s.update(&DVec::zeros(3)).unwrap_err();
        assert!(matches!(err, SuggestError::Bank(_)));
        assert_eq!(s.ensemble().densities(), &[1.0]);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut s = suggester(&[vec![0.5, 0.5], vec![0.25, 0.75]], vec![1.0, 1.0], SuggesterConfig::default());
        s.update(&DVec::from_vec(vec![1.0, 0.0])).unwrap();

        let json = serde_json::to_string(&s.snapshot()).unwrap();
        let snapshot: SuggesterSnapshot = serde_json::from_str(&json).unwrap();
        let restored = Suggester::from_snapshot(&snapshot, SuggesterConfig::default()).unwrap();

        assert_eq!(restored.ensemble().densities(), s.ensemble().densities());
        let x = DVec::from_vec(vec![7.0, -1.0]);
        assert_eq!(restored.suggest(&x).unwrap(), s.suggest(&x).unwrap());
    }
}
