use std::fmt::Debug;

use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal, Uniform};

use crate::{EvoErr, Result};

/// Perturbs genes in place.
pub trait Mutation: Debug + Send + Sync {
    /// Mutates every gene with the operator's probability.
    ///
    /// # Arguments
    /// * `genes` - The genes to mutate.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// The amount of mutated genes.
    fn mutate(&self, genes: &mut [f32], rng: &mut dyn RngCore) -> usize;
}

fn check_rate(rate: f32) -> Result<()> {
    if !(0. ..=1.).contains(&rate) {
        return Err(EvoErr::InvalidConfig(format!(
            "mutation rate must be in [0, 1], got {rate}"
        )));
    }

    Ok(())
}

/// Adds `N(0, std_dev)` noise to a gene.
#[derive(Debug, Clone)]
pub struct GaussianMutation {
    rate: f32,
    noise: Normal<f32>,
}

impl GaussianMutation {
    /// Creates a new `GaussianMutation`.
    ///
    /// # Arguments
    /// * `rate` - The per gene mutation probability, in `[0, 1]`.
    /// * `std_dev` - The standard deviation of the noise.
    ///
    /// # Returns
    /// An error if the rate or the deviation are invalid.
    pub fn new(rate: f32, std_dev: f32) -> Result<Self> {
        check_rate(rate)?;
        if !(std_dev.is_finite() && std_dev >= 0.) {
            return Err(EvoErr::InvalidConfig(format!(
                "mutation std_dev must be finite and >= 0, got {std_dev}"
            )));
        }

        Ok(Self {
            rate,
            noise: Normal::new(0., std_dev)?,
        })
    }
}

impl Mutation for GaussianMutation {
    fn mutate(&self, genes: &mut [f32], rng: &mut dyn RngCore) -> usize {
        let mut mutated = 0;

        for gene in genes {
            if rng.random::<f32>() < self.rate {
                *gene += self.noise.sample(rng);
                mutated += 1;
            }
        }

        mutated
    }
}

/// Resets a gene to a value drawn uniformly from `[low, high]`.
#[derive(Debug, Clone)]
pub struct UniformMutation {
    rate: f32,
    values: Uniform<f32>,
}

impl UniformMutation {
    /// Creates a new `UniformMutation`.
    ///
    /// # Arguments
    /// * `rate` - The per gene mutation probability, in `[0, 1]`.
    /// * `low` - The inclusive lower limit.
    /// * `high` - The inclusive upper limit.
    ///
    /// # Returns
    /// An error if the rate is invalid or `low > high`.
    pub fn new(rate: f32, low: f32, high: f32) -> Result<Self> {
        check_rate(rate)?;

        Ok(Self {
            rate,
            values: Uniform::new_inclusive(low, high)?,
        })
    }
}

impl Mutation for UniformMutation {
    fn mutate(&self, genes: &mut [f32], rng: &mut dyn RngCore) -> usize {
        let mut mutated = 0;

        for gene in genes {
            if rng.random::<f32>() < self.rate {
                *gene = self.values.sample(rng);
                mutated += 1;
            }
        }

        mutated
    }
}
