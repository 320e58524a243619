use std::{
    fs::File,
    io::BufReader,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use evolution::{GaConfig, Refinement};
use machine_learning::ClassifierSpec;
use serde::{Deserialize, Serialize};

use crate::{EvolverErr, Result};

const DEFAULT_SAMPLES_PER_CLASS: NonZeroUsize = NonZeroUsize::new(60).unwrap();

/// The specification for where the digits come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSpec {
    /// An optdigits formatted CSV file.
    Digits { path: PathBuf },
    /// Noisy renderings of built-in glyphs.
    Synthetic {
        #[serde(default = "default_samples_per_class")]
        samples_per_class: NonZeroUsize,
        #[serde(default = "default_noise")]
        noise: f32,
    },
}

impl Default for DatasetSpec {
    fn default() -> Self {
        DatasetSpec::Synthetic {
            samples_per_class: default_samples_per_class(),
            noise: default_noise(),
        }
    }
}

fn default_samples_per_class() -> NonZeroUsize {
    DEFAULT_SAMPLES_PER_CLASS
}

fn default_noise() -> f32 {
    0.15
}

/// The specification for the files a run writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSpec {
    pub json: Option<PathBuf>,
    pub history_csv: Option<PathBuf>,
}

/// The configuration of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub dataset: DatasetSpec,
    /// The fraction of samples held out for the final test scores.
    pub test_size: f32,
    /// The fraction of the training samples held out as fitness data for the evolution.
    pub validation_size: f32,
    pub split_seed: u64,
    pub classifier: ClassifierSpec,
    pub genetic: GaConfig,
    pub refinement: Option<Refinement>,
    pub report: ReportSpec,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetSpec::default(),
            test_size: 0.2,
            validation_size: 0.2,
            split_seed: 42,
            classifier: ClassifierSpec::default(),
            genetic: GaConfig::default(),
            refinement: None,
            report: ReportSpec::default(),
        }
    }
}

impl RunConfig {
    /// Reads a JSON configuration, missing fields take their defaults.
    ///
    /// # Arguments
    /// * `path` - The path to the configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field, delegating to the classifier and genetic algorithm configs.
    pub fn validate(&self) -> Result<()> {
        for (name, fraction) in [
            ("test_size", self.test_size),
            ("validation_size", self.validation_size),
        ] {
            if !(fraction > 0. && fraction < 1.) {
                return Err(EvolverErr::InvalidConfig(format!(
                    "{name} must be in (0, 1), got {fraction}"
                )));
            }
        }

        if let DatasetSpec::Synthetic { noise, .. } = self.dataset {
            if !(noise.is_finite() && noise >= 0.) {
                return Err(EvolverErr::InvalidConfig(format!(
                    "synthetic noise must be finite and >= 0, got {noise}"
                )));
            }
        }

        if let Some(refinement) = self.refinement {
            if !(refinement.learning_rate.is_finite() && refinement.learning_rate > 0.) {
                return Err(EvolverErr::InvalidConfig(format!(
                    "refinement learning_rate must be finite and > 0, got {}",
                    refinement.learning_rate
                )));
            }
        }

        self.classifier.validate()?;
        self.genetic.validate()?;
        Ok(())
    }

    /// Seeds every random component of the run.
    pub fn seed_all(&mut self, seed: u64) {
        self.split_seed = seed;
        self.classifier.seed = Some(seed);
        self.genetic.seed = Some(seed);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let json = serde_json::to_string(&RunConfig::default()).unwrap();
        let config: RunConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, RunConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_config_keeps_the_other_defaults() {
        let config: RunConfig = serde_json::from_str(
            r#"{
                "dataset": { "digits": { "path": "optdigits.tra" } },
                "genetic": { "population_size": 10 },
                "refinement": { "epochs": 2 }
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.dataset,
            DatasetSpec::Digits {
                path: "optdigits.tra".into()
            }
        );
        assert_eq!(config.genetic.population_size, 10);
        assert_eq!(config.genetic.max_generations, 100);
        assert_eq!(config.refinement.map(|r| r.epochs.get()), Some(2));
        assert_eq!(config.test_size, 0.2);
    }

    #[test]
    fn partial_synthetic_dataset_takes_the_missing_defaults() {
        let config: RunConfig =
            serde_json::from_str(r#"{ "dataset": { "synthetic": { "samples_per_class": 100 } } }"#)
                .unwrap();

        assert_eq!(
            config.dataset,
            DatasetSpec::Synthetic {
                samples_per_class: NonZeroUsize::new(100).unwrap(),
                noise: 0.15,
            }
        );

        let config: RunConfig =
            serde_json::from_str(r#"{ "dataset": { "synthetic": {} } }"#).unwrap();
        assert_eq!(config.dataset, DatasetSpec::default());
    }

    #[test]
    fn invalid_solver_fails_to_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "classifier": {{ "solver": "liblinear" }} }}"#).unwrap();

        assert!(matches!(RunConfig::load(file.path()), Err(EvolverErr::Json(_))));
    }

    #[test]
    fn nested_validation_is_delegated() {
        let mut config = RunConfig::default();
        config.genetic.elitism = config.genetic.population_size;
        assert!(matches!(config.validate(), Err(EvolverErr::Evo(_))));

        let mut config = RunConfig::default();
        config.classifier.tol = -1.;
        assert!(matches!(config.validate(), Err(EvolverErr::Ml(_))));

        let config = RunConfig {
            test_size: 1.,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EvolverErr::InvalidConfig(_))));
    }

    #[test]
    fn seed_all_reaches_every_component() {
        let mut config = RunConfig::default();
        config.seed_all(9);

        assert_eq!(config.split_seed, 9);
        assert_eq!(config.classifier.seed, Some(9));
        assert_eq!(config.genetic.seed, Some(9));
    }
}
