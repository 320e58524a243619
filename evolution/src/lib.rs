//! A genetic algorithm over flat parameter vectors, used to evolve the weights of the
//! classifiers in `machine_learning`.

mod algorithm;
mod builder;
pub mod config;
pub mod error;
pub mod fitness;
mod genome;
pub mod operators;

pub use algorithm::{Evolution, GenerationStats, GeneticAlgorithm, Termination};
pub use builder::GeneticAlgorithmBuilder;
pub use config::GaConfig;
pub use error::{EvoErr, Result};
pub use fitness::{ClassifierFitness, Fitness, FnFitness, Refinement};
pub use genome::Genome;
