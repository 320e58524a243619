use crate::{
    GaConfig, GeneticAlgorithm, Result,
    config::{CrossoverSpec, MutationSpec, SelectionSpec},
    operators::{
        BlendCrossover, Crossover, GaussianMutation, Mutation, RouletteSelection,
        Selection, SinglePointCrossover, TournamentSelection, UniformCrossover, UniformMutation,
    },
};

/// Builds `GeneticAlgorithm`s given a configuration.
#[derive(Default)]
pub struct GeneticAlgorithmBuilder;

impl GeneticAlgorithmBuilder {
    /// Creates a new `GeneticAlgorithmBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `GeneticAlgorithm` following a configuration.
    ///
    /// # Arguments
    /// * `config` - The configuration for the algorithm, validated before resolving its operators.
    pub fn build(&self, config: GaConfig) -> Result<GeneticAlgorithm> {
        config.validate()?;

        let selection = self.resolve_selection(config.selection);
        let crossover = self.resolve_crossover(config.crossover)?;
        let mutation = self.resolve_mutation(config.mutation, config.mutation_rate)?;

        Ok(GeneticAlgorithm::with_operators(
            config, selection, crossover, mutation,
        ))
    }

    fn resolve_selection(&self, spec: SelectionSpec) -> Box<dyn Selection> {
        match spec {
            SelectionSpec::Tournament { size } => Box::new(TournamentSelection::new(size)),
            SelectionSpec::Roulette => Box::new(RouletteSelection::new()),
        }
    }

    fn resolve_crossover(&self, spec: CrossoverSpec) -> Result<Box<dyn Crossover>> {
        let crossover: Box<dyn Crossover> = match spec {
            CrossoverSpec::Uniform => Box::new(UniformCrossover),
            CrossoverSpec::SinglePoint => Box::new(SinglePointCrossover),
            CrossoverSpec::Blend { alpha } => Box::new(BlendCrossover::new(alpha)?),
        };

        Ok(crossover)
    }

    fn resolve_mutation(&self, spec: MutationSpec, rate: f32) -> Result<Box<dyn Mutation>> {
        let mutation: Box<dyn Mutation> = match spec {
            MutationSpec::Gaussian { std_dev } => Box::new(GaussianMutation::new(rate, std_dev)?),
            MutationSpec::Uniform { low, high } => {
                Box::new(UniformMutation::new(rate, low, high)?)
            }
        };

        Ok(mutation)
    }
}
