use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::{MlErr, Result, arch::activations::ActFn, initialization::WeightInit};

const DEFAULT_HIDDEN: NonZeroUsize = NonZeroUsize::new(64).unwrap();
const DEFAULT_MAX_ITER: NonZeroUsize = NonZeroUsize::new(200).unwrap();
const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(200).unwrap();
const DEFAULT_N_ITER_NO_CHANGE: NonZeroUsize = NonZeroUsize::new(10).unwrap();

/// The specification for the hidden layers' `ActFn`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFnSpec {
    Identity,
    Logistic,
    Tanh,
    #[default]
    Relu,
}

impl ActFnSpec {
    pub fn resolve(self) -> ActFn {
        match self {
            ActFnSpec::Identity => ActFn::Identity,
            ActFnSpec::Logistic => ActFn::sigmoid(1.),
            ActFnSpec::Tanh => ActFn::Tanh,
            ActFnSpec::Relu => ActFn::Relu,
        }
    }
}

/// The specification for the classifier's `Optimizer`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverSpec {
    /// Mini-batch gradient descent, with momentum when `momentum > 0`.
    Sgd {
        #[serde(default = "default_sgd_learning_rate")]
        learning_rate: f32,
        #[serde(default)]
        momentum: f32,
    },
    Adam {
        #[serde(default = "default_adam_learning_rate")]
        learning_rate: f32,
        #[serde(default = "default_beta1")]
        beta1: f32,
        #[serde(default = "default_beta2")]
        beta2: f32,
        #[serde(default = "default_epsilon")]
        epsilon: f32,
    },
}

impl Default for SolverSpec {
    fn default() -> Self {
        SolverSpec::Adam {
            learning_rate: default_adam_learning_rate(),
            beta1: default_beta1(),
            beta2: default_beta2(),
            epsilon: default_epsilon(),
        }
    }
}

fn default_sgd_learning_rate() -> f32 {
    1e-2
}

fn default_adam_learning_rate() -> f32 {
    1e-3
}

fn default_beta1() -> f32 {
    0.9
}

fn default_beta2() -> f32 {
    0.999
}

fn default_epsilon() -> f32 {
    1e-8
}

/// The specification for an `MlpClassifier`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierSpec {
    pub hidden_layers: Vec<NonZeroUsize>,
    pub activation: ActFnSpec,
    pub init: WeightInit,
    pub solver: SolverSpec,
    pub max_iter: NonZeroUsize,
    pub batch_size: NonZeroUsize,
    pub tol: f32,
    pub n_iter_no_change: NonZeroUsize,
    pub seed: Option<u64>,
}

impl Default for ClassifierSpec {
    fn default() -> Self {
        Self {
            hidden_layers: vec![DEFAULT_HIDDEN],
            activation: ActFnSpec::default(),
            init: WeightInit::default(),
            solver: SolverSpec::default(),
            max_iter: DEFAULT_MAX_ITER,
            batch_size: DEFAULT_BATCH_SIZE,
            tol: 1e-4,
            n_iter_no_change: DEFAULT_N_ITER_NO_CHANGE,
            seed: None,
        }
    }
}

impl ClassifierSpec {
    /// Checks the numeric bounds serde can't express.
    ///
    /// # Returns
    /// An `InvalidSpec` error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.tol.is_finite() && self.tol >= 0.) {
            return Err(invalid(format!("tol must be finite and >= 0, got {}", self.tol)));
        }

        match self.solver {
            SolverSpec::Sgd {
                learning_rate,
                momentum,
            } => {
                check_learning_rate(learning_rate)?;
                if !(0. ..1.).contains(&momentum) {
                    return Err(invalid(format!("momentum must be in [0, 1), got {momentum}")));
                }
            }
            SolverSpec::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => {
                check_learning_rate(learning_rate)?;
                for (name, beta) in [("beta1", beta1), ("beta2", beta2)] {
                    if !(0. ..1.).contains(&beta) {
                        return Err(invalid(format!("{name} must be in [0, 1), got {beta}")));
                    }
                }
                if !(epsilon > 0.) {
                    return Err(invalid(format!("epsilon must be > 0, got {epsilon}")));
                }
            }
        }

        Ok(())
    }
}

fn check_learning_rate(learning_rate: f32) -> Result<()> {
    if !(learning_rate.is_finite() && learning_rate > 0.) {
        return Err(invalid(format!(
            "learning_rate must be finite and > 0, got {learning_rate}"
        )));
    }

    Ok(())
}

fn invalid(msg: String) -> MlErr {
    MlErr::InvalidSpec(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_the_defaults() {
        let spec: ClassifierSpec = serde_json::from_str("{}").unwrap();

        assert_eq!(spec, ClassifierSpec::default());
        assert_eq!(spec.hidden_layers, [DEFAULT_HIDDEN]);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn solver_fields_fall_back_to_defaults() {
        let spec: ClassifierSpec =
            serde_json::from_str(r#"{ "solver": { "sgd": { "momentum": 0.9 } } }"#).unwrap();

        assert_eq!(
            spec.solver,
            SolverSpec::Sgd {
                learning_rate: 1e-2,
                momentum: 0.9
            }
        );
    }

    #[test]
    fn unknown_solver_is_rejected() {
        let err = serde_json::from_str::<ClassifierSpec>(r#"{ "solver": "liblinear" }"#)
            .unwrap_err()
            .to_string();

        assert!(err.contains("liblinear"), "{err}");
    }

    #[test]
    fn zero_sized_hidden_layer_is_rejected() {
        assert!(serde_json::from_str::<ClassifierSpec>(r#"{ "hidden_layers": [0] }"#).is_err());
    }

    #[test]
    fn activations_resolve() {
        let spec: ClassifierSpec = serde_json::from_str(r#"{ "activation": "logistic" }"#).unwrap();

        assert_eq!(spec.activation.resolve(), ActFn::sigmoid(1.));
        assert_eq!(ActFnSpec::Relu.resolve(), ActFn::Relu);
    }

    #[test]
    fn out_of_range_hyperparameters_fail_validation() {
        let mut spec = ClassifierSpec {
            tol: -1.,
            ..Default::default()
        };
        assert!(matches!(spec.validate(), Err(MlErr::InvalidSpec(_))));

        spec.tol = 1e-4;
        spec.solver = SolverSpec::Sgd {
            learning_rate: 0.,
            momentum: 0.,
        };
        assert!(spec.validate().is_err());

        spec.solver = SolverSpec::Adam {
            learning_rate: 1e-3,
            beta1: 1.,
            beta2: 0.999,
            epsilon: 1e-8,
        };
        assert!(spec.validate().is_err());
    }
}
