//! Selection, crossover and mutation operators.
//!
//! Operators receive the generator as `&mut dyn RngCore` so that the algorithm can hold
//! them as trait objects resolved from the configuration.

mod crossover;
mod mutation;
mod selection;

pub use crossover::{BlendCrossover, Crossover, SinglePointCrossover, UniformCrossover};
pub use mutation::{GaussianMutation, Mutation, UniformMutation};
pub use selection::{RouletteSelection, Selection, TournamentSelection};
