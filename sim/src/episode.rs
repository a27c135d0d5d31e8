//! Lost-item episodes.
//!
//! One episode walks the scenario's motion chain from a start state. On every
//! move into a *different* state `i` the item is lost with probability
//! `true_miss[i]`; its position is then drawn from state `i`'s Gaussian.
//! This is the generative process whose absorption probabilities the
//! suggester's weight solver computes in closed form.

use crate::scenarios::Scenario;
use anyhow::{anyhow, Result};
use nalgebra::{Cholesky, Matrix2, Vector2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Where and when the item went missing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LostItem {
    /// Motion state the item was lost in
    pub state: usize,
    /// Position drawn from that state's density
    pub position: [f64; 2],
    /// Number of moves before the loss
    pub moves: usize,
}

/// Generates lost-item episodes for one scenario.
pub struct LostItemSimulator {
    scenario: Scenario,
    /// Lower Cholesky factor of each state's position covariance
    factors: Vec<Matrix2<f64>>,
    rng: ChaCha8Rng,
}

impl LostItemSimulator {
    pub fn new(scenario: Scenario, seed: u64) -> Result<Self> {
        let factors = scenario
            .states
            .iter()
            .map(|s| {
                Cholesky::new(Matrix2::from_row_slice(&s.cov))
                    .map(|c| c.l())
                    .ok_or_else(|| anyhow!("covariance of state '{}' is not positive definite", s.name))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            scenario,
            factors,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Index drawn from a discrete distribution.
    fn categorical(rng: &mut ChaCha8Rng, probs: &[f64]) -> usize {
        let u = rng.gen::<f64>();
        let mut cumulative = 0.0;
        for (i, &p) in probs.iter().enumerate() {
            cumulative += p;
            if u < cumulative {
                return i;
            }
        }
        // rounding: fall back to the last state with any mass
        probs.iter().rposition(|&p| p > 0.0).unwrap_or(0)
    }

    fn draw_position(&mut self, state: usize) -> [f64; 2] {
        let z = Vector2::new(
            self.rng.sample::<f64, _>(StandardNormal),
            self.rng.sample::<f64, _>(StandardNormal),
        );
        let mean = Vector2::from(self.scenario.states[state].mean);
        let p = mean + self.factors[state] * z;
        [p.x, p.y]
    }

    /// Run one episode. `None` if the item was still carried after
    /// `max_steps` moves.
    pub fn episode(&mut self) -> Option<LostItem> {
        let mut current = Self::categorical(&mut self.rng, &self.scenario.start);
        for moves in 1..=self.scenario.max_steps {
            let next = Self::categorical(&mut self.rng, &self.scenario.transition[current]);
            if next != current && self.rng.gen::<f64>() < self.scenario.true_miss[next] {
                return Some(LostItem {
                    state: next,
                    position: self.draw_position(next),
                    moves,
                });
            }
            current = next;
        }
        None
    }
}
