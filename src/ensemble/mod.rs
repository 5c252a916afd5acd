//! Ensemble decision engine.

mod config;
mod engine;
mod vector;

pub use config::{EnsembleConfig, threshold_from_percent};
pub use engine::{EnsembleEngine, Prediction, fuse};
pub use vector::ProbabilityVector;
