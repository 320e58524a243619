use std::fmt::Debug;

use rand::{Rng, RngCore};

use crate::{EvoErr, Result};

/// Recombines two parents into two children of the same length.
pub trait Crossover: Debug + Send + Sync {
    /// Crosses two parents.
    ///
    /// # Arguments
    /// * `a` - The first parent's genes.
    /// * `b` - The second parent's genes, as long as `a`.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// Two children or an error if the parents' lengths differ.
    fn crossover(&self, a: &[f32], b: &[f32], rng: &mut dyn RngCore)
    -> Result<(Vec<f32>, Vec<f32>)>;
}

fn check_lengths(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(EvoErr::GenomeLength {
            got: b.len(),
            expected: a.len(),
        });
    }

    Ok(())
}

/// Swaps every gene between the parents with probability 1/2.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformCrossover;

impl Crossover for UniformCrossover {
    fn crossover(
        &self,
        a: &[f32],
        b: &[f32],
        rng: &mut dyn RngCore,
    ) -> Result<(Vec<f32>, Vec<f32>)> {
        check_lengths(a, b)?;

        let (mut x, mut y) = (a.to_vec(), b.to_vec());
        for (gx, gy) in x.iter_mut().zip(y.iter_mut()) {
            if rng.random_bool(0.5) {
                std::mem::swap(gx, gy);
            }
        }

        Ok((x, y))
    }
}

/// Exchanges the tails of the parents after a random cut point in `1..len`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePointCrossover;

impl Crossover for SinglePointCrossover {
    fn crossover(
        &self,
        a: &[f32],
        b: &[f32],
        rng: &mut dyn RngCore,
    ) -> Result<(Vec<f32>, Vec<f32>)> {
        check_lengths(a, b)?;

        let (mut x, mut y) = (a.to_vec(), b.to_vec());
        if a.len() < 2 {
            return Ok((x, y));
        }

        let cut = rng.random_range(1..a.len());
        x[cut..].swap_with_slice(&mut y[cut..]);

        Ok((x, y))
    }
}

/// BLX-α: every child gene is drawn uniformly from the parents' interval widened by
/// `alpha` times its length on each side.
#[derive(Debug, Clone, Copy)]
pub struct BlendCrossover {
    alpha: f32,
}

impl BlendCrossover {
    /// Creates a new `BlendCrossover`, `alpha` must be finite and non negative.
    pub fn new(alpha: f32) -> Result<Self> {
        if !(alpha.is_finite() && alpha >= 0.) {
            return Err(EvoErr::InvalidConfig(format!(
                "blend alpha must be finite and >= 0, got {alpha}"
            )));
        }

        Ok(Self { alpha })
    }

    fn blend(&self, a: f32, b: f32, rng: &mut dyn RngCore) -> f32 {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let d = self.alpha * (hi - lo);
        let lo = (lo - d).max(f32::MIN);
        let hi = (hi + d).min(f32::MAX);

        if lo < hi {
            // interpolating keeps the sample finite even when `hi - lo` overflows
            let t: f32 = rng.random();
            (lo * (1. - t) + hi * t).clamp(lo, hi)
        } else {
            lo
        }
    }
}

impl Crossover for BlendCrossover {
    fn crossover(
        &self,
        a: &[f32],
        b: &[f32],
        rng: &mut dyn RngCore,
    ) -> Result<(Vec<f32>, Vec<f32>)> {
        check_lengths(a, b)?;

        let mut x = Vec::with_capacity(a.len());
        let mut y = Vec::with_capacity(a.len());
        for (&ga, &gb) in a.iter().zip(b) {
            x.push(self.blend(ga, gb, rng));
            y.push(self.blend(ga, gb, rng));
        }

        Ok((x, y))
    }
}
