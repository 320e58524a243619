//! Fits a digits classifier and evolves its weights with a genetic algorithm.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;

pub use config::RunConfig;
pub use error::{EvolverErr, Result};
pub use report::{FitReport, RunReport};
