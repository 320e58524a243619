use std::fmt::{self, Display};

use log::{debug, info, warn};
use machine_learning::training::seeded_rng;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    EvoErr, Fitness, GaConfig, Genome, GeneticAlgorithmBuilder, Result,
    operators::{Crossover, Mutation, Selection},
};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    TargetReached,
    Stagnated,
    MaxGenerations,
}

impl Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Termination::TargetReached => "target fitness reached",
            Termination::Stagnated => "best fitness stagnated",
            Termination::MaxGenerations => "max generations reached",
        };

        f.write_str(reason)
    }
}

/// The fitness summary of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub best: f32,
    pub mean: f32,
    pub worst: f32,
    pub std_dev: f32,
}

impl GenerationStats {
    /// Summarizes a population sorted by descending fitness.
    fn new(generation: usize, population: &[Genome]) -> Result<Self> {
        let (Some(first), Some(last)) = (population.first(), population.last()) else {
            return Err(EvoErr::NoPopulation);
        };

        let n = population.len() as f32;
        let mean = population.iter().map(Genome::rank).sum::<f32>() / n;
        let variance = population
            .iter()
            .map(|genome| (genome.rank() - mean).powi(2))
            .sum::<f32>()
            / n;

        Ok(Self {
            generation,
            best: first.rank(),
            mean,
            worst: last.rank(),
            std_dev: variance.sqrt(),
        })
    }
}

/// The outcome of a `GeneticAlgorithm` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evolution {
    /// The fittest individual of the last generation.
    pub best: Genome,
    /// One entry per generation, starting with the initial population as generation 0.
    pub history: Vec<GenerationStats>,
    pub termination: Termination,
    /// The amount of fitness evaluations performed.
    pub evaluations: usize,
}

/// A generational genetic algorithm over flat `f32` genomes.
///
/// The population starts as noisy copies of a seed genome. Every generation keeps the
/// `elitism` fittest individuals untouched and fills the rest with mutated offspring of
/// selected parents. Offspring are evaluated in parallel.
#[derive(Debug)]
pub struct GeneticAlgorithm {
    config: GaConfig,
    selection: Box<dyn Selection>,
    crossover: Box<dyn Crossover>,
    mutation: Box<dyn Mutation>,
}

impl GeneticAlgorithm {
    /// Creates a new `GeneticAlgorithm` with the operators described by `config`.
    pub fn new(config: GaConfig) -> Result<Self> {
        GeneticAlgorithmBuilder::new().build(config)
    }

    /// Creates a new `GeneticAlgorithm` with custom operators.
    ///
    /// # Arguments
    /// * `config` - The configuration, its operator specs are ignored.
    /// * `selection` - Picks the parents.
    /// * `crossover` - Recombines the parents.
    /// * `mutation` - Perturbs the offspring.
    pub fn with_operators(
        config: GaConfig,
        selection: Box<dyn Selection>,
        crossover: Box<dyn Crossover>,
        mutation: Box<dyn Mutation>,
    ) -> Self {
        Self {
            config,
            selection,
            crossover,
            mutation,
        }
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Evolves a population seeded with `initial`.
    ///
    /// # Arguments
    /// * `initial` - The seed genome, it is kept unchanged as the first individual.
    /// * `fitness` - The fitness function, all genomes share the seed's length.
    ///
    /// # Returns
    /// The best individual, the per generation history and why the run stopped.
    pub fn run<F: Fitness>(&self, initial: Vec<f32>, fitness: &F) -> Result<Evolution> {
        self.run_with(initial, fitness, |_| {})
    }

    /// Same as `run`, calling `observer` with the stats of every generation.
    pub fn run_with<F, O>(&self, initial: Vec<f32>, fitness: &F, mut observer: O) -> Result<Evolution>
    where
        F: Fitness,
        O: FnMut(&GenerationStats),
    {
        self.config.validate()?;

        if initial.is_empty() {
            return Err(EvoErr::EmptyGenome);
        }

        let mut rng = seeded_rng(self.config.seed);
        let mut population = self.init_population(initial, &mut rng)?;
        let mut evaluations = evaluate(&mut population, fitness)?;
        sort(&mut population);

        let stats = GenerationStats::new(0, &population)?;
        info!(
            best = stats.best,
            mean = stats.mean,
            population = population.len();
            "evaluated initial population"
        );
        observer(&stats);

        let mut history = vec![stats];
        let mut best_so_far = stats.best;
        let mut stale = 0;
        let mut generation = 0;

        let termination = loop {
            let best = population[0].rank();

            if self.config.target_fitness.is_some_and(|target| best >= target) {
                break Termination::TargetReached;
            }

            if self
                .config
                .stagnation_limit
                .is_some_and(|limit| stale >= limit.get())
            {
                break Termination::Stagnated;
            }

            if generation == self.config.max_generations {
                break Termination::MaxGenerations;
            }

            generation += 1;
            population = self.breed(&population, &mut rng)?;
            evaluations += evaluate(&mut population, fitness)?;
            sort(&mut population);

            let stats = GenerationStats::new(generation, &population)?;
            debug!(
                generation = generation,
                best = stats.best,
                mean = stats.mean,
                worst = stats.worst;
                "finished generation"
            );
            observer(&stats);
            history.push(stats);

            if stats.best > best_so_far + self.config.min_improvement {
                best_so_far = stats.best;
                stale = 0;
            } else {
                stale += 1;
            }
        };

        info!(
            generations = generation,
            best = population[0].rank(),
            evaluations = evaluations;
            "evolution finished: {termination}"
        );

        let best = population.swap_remove(0);
        Ok(Evolution {
            best,
            history,
            termination,
            evaluations,
        })
    }

    fn init_population(&self, initial: Vec<f32>, rng: &mut dyn RngCore) -> Result<Vec<Genome>> {
        let noise = Normal::new(0., self.config.init_std)?;
        let mut population = Vec::with_capacity(self.config.population_size);

        for _ in 1..self.config.population_size {
            let genes = initial.iter().map(|g| g + noise.sample(rng)).collect();
            population.push(Genome::new(genes));
        }
        population.insert(0, Genome::new(initial));

        Ok(population)
    }

    fn breed(&self, population: &[Genome], rng: &mut dyn RngCore) -> Result<Vec<Genome>> {
        let size = self.config.population_size;
        let mut next: Vec<Genome> = population.iter().take(self.config.elitism).cloned().collect();

        while next.len() < size {
            let a = &population[self.selection.select(population, rng)];
            let b = &population[self.selection.select(population, rng)];

            let children = if rng.random::<f32>() < self.config.crossover_rate {
                let (x, y) = self.crossover.crossover(a.genes(), b.genes(), rng)?;
                [Genome::new(x), Genome::new(y)]
            } else {
                [a.clone(), b.clone()]
            };

            for mut child in children {
                if next.len() == size {
                    break;
                }

                self.mutate(&mut child, rng);
                next.push(child);
            }
        }

        Ok(next)
    }

    /// Mutates a child, an untouched clone keeps its parent's fitness.
    fn mutate(&self, child: &mut Genome, rng: &mut dyn RngCore) {
        let fitness = child.fitness();
        let mutated = self.mutation.mutate(child.genes_mut(), rng);

        if let (0, Some(fitness)) = (mutated, fitness) {
            child.set_fitness(fitness);
        }
    }
}

/// Evaluates every individual without a fitness, in parallel.
///
/// # Returns
/// The amount of evaluations performed.
fn evaluate<F: Fitness>(population: &mut [Genome], fitness: &F) -> Result<usize> {
    let pending = population.iter().filter(|g| !g.is_evaluated()).count();

    population
        .par_iter_mut()
        .filter(|genome| !genome.is_evaluated())
        .try_for_each(|genome| -> Result<()> {
            let mut value = fitness.evaluate(genome.genes_mut())?;
            if value.is_nan() {
                warn!("fitness evaluated to NaN, ranking it last");
                value = f32::NEG_INFINITY;
            }

            genome.set_fitness(value);
            Ok(())
        })?;

    Ok(pending)
}

/// Sorts by descending fitness, keeping the relative order of ties.
fn sort(population: &mut [Genome]) {
    population.sort_by(|a, b| b.rank().total_cmp(&a.rank()));
}
