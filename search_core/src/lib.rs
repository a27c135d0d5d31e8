//! `search_core` — Where is the lost item most likely to be?
//!
//! The item's movement is a hidden Markov chain over a few motion states.
//! Each state has a Gaussian position density. Whenever the item changes state
//! it may be lost there, with an unknown per-state miss probability; belief
//! over those probabilities is a weighted Monte Carlo ensemble.
//!
//! # Module layout
//! - [`types`]     — Scalar alias, shaped raw input arrays
//! - [`error`]     — Shape / numeric / bank errors
//! - [`motion`]    — Start distribution, transition matrix, input validation
//! - [`weight`]    — Absorbing-chain solver: miss probabilities → state weights
//! - [`ensemble`]  — Miss-probability samples, densities, expectations
//! - [`suggester`] — `suggest` / `update` orchestration and config
//! - [`snapshot`]  — Serializable record for persistence

pub mod ensemble;
pub mod error;
pub mod motion;
pub mod snapshot;
pub mod suggester;
pub mod types;
pub mod weight;

pub use ensemble::Ensemble;
pub use error::{NumericError, Result, ShapeError, SuggestError};
pub use gaussian_bank::{BankError, GaussianBank};
pub use motion::MotionModel;
pub use snapshot::SuggesterSnapshot;
pub use suggester::{NonFinitePolicy, Suggester, SuggesterConfig};
pub use types::{DMat, DVec, RawArray, Real};
