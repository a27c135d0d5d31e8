//! `sim` — Lost-item scenarios, episode simulation, ensemble seeding, snapshot
//! storage.

pub mod cube;
pub mod episode;
pub mod scenarios;
pub mod store;

pub use cube::{uniform_ensemble, UniformCube};
pub use episode::{LostItem, LostItemSimulator};
pub use scenarios::{Scenario, ScenarioKind};
pub use store::{load_snapshot, save_snapshot};
