use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::{EvoErr, Result};

const DEFAULT_TOURNAMENT_SIZE: NonZeroUsize = NonZeroUsize::new(3).unwrap();
const DEFAULT_STAGNATION_LIMIT: NonZeroUsize = NonZeroUsize::new(20).unwrap();

/// The specification for the `Selection` trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSpec {
    Tournament { size: NonZeroUsize },
    Roulette,
}

impl Default for SelectionSpec {
    fn default() -> Self {
        SelectionSpec::Tournament {
            size: DEFAULT_TOURNAMENT_SIZE,
        }
    }
}

/// The specification for the `Crossover` trait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverSpec {
    #[default]
    Uniform,
    SinglePoint,
    Blend {
        alpha: f32,
    },
}

/// The specification for the `Mutation` trait, the rate is `GaConfig::mutation_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationSpec {
    Gaussian { std_dev: f32 },
    Uniform { low: f32, high: f32 },
}

impl Default for MutationSpec {
    fn default() -> Self {
        MutationSpec::Gaussian { std_dev: 0.1 }
    }
}

/// The configuration of a `GeneticAlgorithm` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GaConfig {
    pub population_size: usize,
    pub max_generations: usize,
    pub crossover_rate: f32,
    pub mutation_rate: f32,
    pub mutation: MutationSpec,
    pub crossover: CrossoverSpec,
    pub selection: SelectionSpec,
    /// The amount of top individuals copied as they are into the next generation.
    pub elitism: usize,
    /// The deviation of the noise that spreads the initial population around the seed genome.
    pub init_std: f32,
    /// Stops the run as soon as the best fitness reaches this value.
    pub target_fitness: Option<f32>,
    /// Stops the run after this many generations without improvement, `None` never stops.
    pub stagnation_limit: Option<NonZeroUsize>,
    /// The smallest gain over the best fitness that counts as an improvement.
    pub min_improvement: f32,
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            crossover_rate: 0.5,
            mutation_rate: 0.05,
            mutation: MutationSpec::default(),
            crossover: CrossoverSpec::default(),
            selection: SelectionSpec::default(),
            elitism: 2,
            init_std: 0.1,
            target_fitness: None,
            stagnation_limit: Some(DEFAULT_STAGNATION_LIMIT),
            min_improvement: 1e-6,
            seed: None,
        }
    }
}

impl GaConfig {
    /// Checks the bounds serde can't express.
    ///
    /// # Returns
    /// An `InvalidConfig` error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(invalid(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            )));
        }

        if self.max_generations == 0 {
            return Err(invalid("max_generations must be at least 1".into()));
        }

        for (name, rate) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0. ..=1.).contains(&rate) {
                return Err(invalid(format!("{name} must be in [0, 1], got {rate}")));
            }
        }

        if self.elitism >= self.population_size {
            return Err(invalid(format!(
                "elitism ({}) must be lower than population_size ({})",
                self.elitism, self.population_size
            )));
        }

        if !(self.init_std.is_finite() && self.init_std >= 0.) {
            return Err(invalid(format!(
                "init_std must be finite and >= 0, got {}",
                self.init_std
            )));
        }

        if !(self.min_improvement.is_finite() && self.min_improvement >= 0.) {
            return Err(invalid(format!(
                "min_improvement must be finite and >= 0, got {}",
                self.min_improvement
            )));
        }

        if self.target_fitness.is_some_and(f32::is_nan) {
            return Err(invalid("target_fitness can't be NaN".into()));
        }

        match self.crossover {
            CrossoverSpec::Blend { alpha } if !(alpha.is_finite() && alpha >= 0.) => {
                return Err(invalid(format!(
                    "blend alpha must be finite and >= 0, got {alpha}"
                )));
            }
            _ => {}
        }

        match self.mutation {
            MutationSpec::Gaussian { std_dev } if !(std_dev.is_finite() && std_dev >= 0.) => {
                Err(invalid(format!(
                    "gaussian std_dev must be finite and >= 0, got {std_dev}"
                )))
            }
            MutationSpec::Uniform { low, high }
                if !(low.is_finite() && high.is_finite() && low <= high) =>
            {
                Err(invalid(format!(
                    "uniform mutation bounds must be finite and ordered, got [{low}, {high}]"
                )))
            }
            _ => Ok(()),
        }
    }
}

fn invalid(msg: String) -> EvoErr {
    EvoErr::InvalidConfig(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config: GaConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config, GaConfig::default());
        assert_eq!(config.population_size, 50);
        assert_eq!(config.max_generations, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn operators_deserialize_from_snake_case() {
        let config: GaConfig = serde_json::from_str(
            r#"{
                "selection": "roulette",
                "crossover": { "blend": { "alpha": 0.3 } },
                "mutation": { "uniform": { "low": -1.0, "high": 1.0 } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.selection, SelectionSpec::Roulette);
        assert_eq!(config.crossover, CrossoverSpec::Blend { alpha: 0.3 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<GaConfig>(r#"{ "pop_size": 10 }"#).is_err());
        assert!(serde_json::from_str::<GaConfig>(r#"{ "selection": { "tournament": { "size": 0 } } }"#).is_err());
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let cases = [
            GaConfig {
                population_size: 1,
                elitism: 0,
                ..Default::default()
            },
            GaConfig {
                max_generations: 0,
                ..Default::default()
            },
            GaConfig {
                crossover_rate: 1.5,
                ..Default::default()
            },
            GaConfig {
                mutation_rate: -0.1,
                ..Default::default()
            },
            GaConfig {
                elitism: 50,
                ..Default::default()
            },
            GaConfig {
                init_std: f32::NAN,
                ..Default::default()
            },
            GaConfig {
                crossover: CrossoverSpec::Blend { alpha: -0.5 },
                ..Default::default()
            },
            GaConfig {
                mutation: MutationSpec::Uniform { low: 1., high: 0. },
                ..Default::default()
            },
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(EvoErr::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }
}
