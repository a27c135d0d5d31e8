//! Scenario definitions.
//!
//! Each scenario is a named motion model with per-state position densities and
//! the true (hidden) miss probabilities the simulator loses items with.
//! Scenarios are fixed; randomness only enters through the seeds passed to the
//! ensemble and the episode simulator.

use crate::cube::uniform_ensemble;
use search_core::{RawArray, SuggesterSnapshot};
use serde::{Deserialize, Serialize};

/// Which pre-defined scenario to load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// Keys moving between desk, bag and pocket inside a flat (metres)
    Household,
    /// A wallet on a daily commute: home, train, office, cafe (kilometres)
    Commute,
}

/// One motion state: where the item sits while in it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MotionState {
    pub name: String,
    /// Position mean [x, y]
    pub mean: [f64; 2],
    /// Position covariance, row-major 2×2
    pub cov: [f64; 4],
}

/// A fully configured lost-item scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub states: Vec<MotionState>,
    /// Start distribution over `states`
    pub start: Vec<f64>,
    /// Row-stochastic transition matrix, `transition[i][j]` = P(i → j)
    pub transition: Vec<Vec<f64>>,
    /// Ground-truth miss probabilities, unknown to the suggester
    pub true_miss: Vec<f64>,
    /// Episodes in which the item is still carried after this many moves
    /// count as "not lost"
    pub max_steps: usize,
}

impl Scenario {
    /// Build the named scenario.
    pub fn build(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Household => Self::household(),
            ScenarioKind::Commute => Self::commute(),
        }
    }

    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// Suggester record with a flat miss-probability prior of `n_samples`
    /// points drawn with `seed`.
    pub fn initial_snapshot(&self, n_samples: usize, seed: u64) -> SuggesterSnapshot {
        let (samples, densities) = uniform_ensemble(self.n_states(), n_samples, seed);
        SuggesterSnapshot {
            start: RawArray::vector(self.start.clone()),
            transition: RawArray::from_rows(&self.transition),
            means: self.states.iter().map(|s| s.mean.to_vec()).collect(),
            covariances: self.states.iter().map(|s| s.cov.to_vec()).collect(),
            samples,
            densities,
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 1: Household
    // -----------------------------------------------------------------------
    fn household() -> Self {
        let states = vec![
            state("desk", [0.0, 0.0], [0.25, 0.0, 0.0, 0.25]),
            state("bag", [3.0, 1.0], [0.5, 0.0, 0.0, 0.5]),
            state("pocket", [1.5, 4.0], [2.0, 0.5, 0.5, 1.0]),
        ];

        #[rustfmt::skip]
        let transition = vec![
            // to:  desk  bag   pocket
            vec![   0.7,  0.2,  0.1 ], // from desk
            vec![   0.3,  0.6,  0.1 ], // from bag
            vec![   0.2,  0.2,  0.6 ], // from pocket
        ];

        Scenario {
            name: "household".into(),
            states,
            start: vec![0.6, 0.3, 0.1],
            transition,
            true_miss: vec![0.1, 0.3, 0.6],
            max_steps: 1000,
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 2: Commute
    // -----------------------------------------------------------------------
    fn commute() -> Self {
        let states = vec![
            state("home", [0.0, 0.0], [0.05, 0.0, 0.0, 0.05]),
            state("train", [4.0, 2.0], [1.5, 0.6, 0.6, 0.5]),
            state("office", [8.0, 4.0], [0.05, 0.0, 0.0, 0.05]),
            state("cafe", [7.0, 5.0], [0.1, 0.0, 0.0, 0.1]),
        ];

        #[rustfmt::skip]
        let transition = vec![
            // to:  home  train office cafe
            vec![   0.6,  0.4,  0.0,   0.0 ], // from home
            vec![   0.3,  0.4,  0.3,   0.0 ], // from train
            vec![   0.0,  0.3,  0.5,   0.2 ], // from office
            vec![   0.0,  0.2,  0.4,   0.4 ], // from cafe
        ];

        Scenario {
            name: "commute".into(),
            states,
            start: vec![0.9, 0.05, 0.05, 0.0],
            transition,
            true_miss: vec![0.05, 0.4, 0.1, 0.25],
            max_steps: 1000,
        }
    }
}

fn state(name: &str, mean: [f64; 2], cov: [f64; 4]) -> MotionState {
    MotionState {
        name: name.into(),
        mean,
        cov,
    }
}
