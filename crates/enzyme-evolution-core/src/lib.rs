pub mod arbiter;
pub mod bacterium;
pub mod bits;
pub mod cell;
pub mod component;
pub mod config;
pub mod constants;
pub mod genome;
pub mod grid;
pub mod message;
pub mod metabolism;
pub mod metrics;
pub mod rng;
pub mod simulation;
pub mod snapshot;
pub mod stats;

pub use constants::{CANONICAL_PATTERN_BITS, MAX_GRID_EXTENT};
pub use metrics::{IntervalEfficiency, PopulationSample, PopulationStats, RunSummary};
pub use simulation::Simulation;
