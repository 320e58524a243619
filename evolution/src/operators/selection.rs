use std::{fmt::Debug, num::NonZeroUsize};

use rand::{Rng, RngCore};

use crate::Genome;

/// Picks a parent out of an evaluated population.
pub trait Selection: Debug + Send + Sync {
    /// Selects a parent.
    ///
    /// # Arguments
    /// * `population` - The current population, it must not be empty.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// The index of the selected individual.
    fn select(&self, population: &[Genome], rng: &mut dyn RngCore) -> usize;
}

/// Draws `size` individuals with replacement and keeps the fittest one.
#[derive(Debug, Clone, Copy)]
pub struct TournamentSelection {
    size: NonZeroUsize,
}

impl TournamentSelection {
    pub fn new(size: NonZeroUsize) -> Self {
        Self { size }
    }
}

impl Selection for TournamentSelection {
    fn select(&self, population: &[Genome], rng: &mut dyn RngCore) -> usize {
        let n = population.len();
        let mut winner = rng.random_range(0..n);

        for _ in 1..self.size.get() {
            let challenger = rng.random_range(0..n);
            let (c, w) = (population[challenger].rank(), population[winner].rank());

            // ties go to the lower index
            if c > w || (c == w && challenger < winner) {
                winner = challenger;
            }
        }

        winner
    }
}

/// Fitness proportional selection.
///
/// Fitnesses are shifted so the worst finite one weighs 0. When nothing weighs more than 0
/// the pick is uniform.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouletteSelection;

impl RouletteSelection {
    pub fn new() -> Self {
        Self
    }
}

impl Selection for RouletteSelection {
    fn select(&self, population: &[Genome], rng: &mut dyn RngCore) -> usize {
        let min = population
            .iter()
            .map(Genome::rank)
            .filter(|f| f.is_finite())
            .fold(f32::INFINITY, f32::min);

        let weight = |genome: &Genome| {
            let f = genome.rank();
            if f.is_finite() { f - min } else { 0. }
        };

        let total: f32 = population.iter().map(weight).sum();
        if !(total > 0. && total.is_finite()) {
            return rng.random_range(0..population.len());
        }

        let mut target = rng.random::<f32>() * total;
        let mut last_positive = 0;

        for (i, genome) in population.iter().enumerate() {
            let w = weight(genome);
            if w <= 0. {
                continue;
            }

            if target < w {
                return i;
            }

            target -= w;
            last_positive = i;
        }

        last_positive
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn population(fitness: &[f32]) -> Vec<Genome> {
        fitness
            .iter()
            .map(|&f| {
                let mut genome = Genome::new(vec![f]);
                genome.set_fitness(f);
                genome
            })
            .collect()
    }

    #[test]
    fn big_tournaments_pick_the_fittest() {
        let pop = population(&[0.1, 0.9, 0.5, 0.3]);
        let selection = TournamentSelection::new(NonZeroUsize::new(64).unwrap());
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..10 {
            assert_eq!(selection.select(&pop, &mut rng), 1);
        }
    }

    #[test]
    fn tournament_ties_go_to_the_lower_index() {
        let pop = population(&[0.5, 0.5, 0.5]);
        let selection = TournamentSelection::new(NonZeroUsize::new(64).unwrap());

        assert_eq!(selection.select(&pop, &mut StdRng::seed_from_u64(1)), 0);
    }

    #[test]
    fn tournament_of_one_is_uniform() {
        let pop = population(&[0.1, 0.9]);
        let selection = TournamentSelection::new(NonZeroUsize::MIN);
        let mut rng = StdRng::seed_from_u64(2);

        let picks: Vec<usize> = (0..200).map(|_| selection.select(&pop, &mut rng)).collect();
        assert!(picks.contains(&0));
        assert!(picks.contains(&1));
    }

    #[test]
    fn roulette_never_picks_the_zero_weight() {
        let pop = population(&[0.2, 0.4, 1.0]);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            assert_ne!(RouletteSelection.select(&pop, &mut rng), 0);
        }
    }

    #[test]
    fn roulette_is_uniform_on_a_flat_population() {
        let pop = population(&[0.7; 4]);
        let mut rng = StdRng::seed_from_u64(4);

        let mut counts = [0; 4];
        for _ in 0..400 {
            counts[RouletteSelection.select(&pop, &mut rng)] += 1;
        }
        assert!(counts.iter().all(|&c| c > 0));
    }
}
