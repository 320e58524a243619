use std::{cell::RefCell, num::NonZeroUsize, rc::Rc};

use log::{debug, info, warn};
use ndarray::ArrayView2;
use rand::{SeedableRng, rngs::StdRng};

use super::{ClassifierSpec, SolverSpec};
use crate::{
    Dataset, MlErr, Result,
    arch::{Model, Sequential, layers::Layer, loss::CrossEntropy},
    initialization::init_sequential,
    metrics,
    optimization::{Adam, GradientDescent, GradientDescentWithMomentum, Optimizer},
    training::{ModelTrainer, seeded_rng},
};

/// A multi-layer perceptron classifier.
///
/// Hidden layers apply the configured activation, the output layer emits one logit per
/// class and is trained against `CrossEntropy`, so the predicted class is the largest
/// logit. The parameters live apart from the model in a single flat vector, which is the
/// representation the genetic search works on.
#[derive(Debug, Clone)]
pub struct MlpClassifier {
    spec: ClassifierSpec,
    model: Sequential,
    n_features: usize,
    n_classes: usize,
    params: Option<Vec<f32>>,
    loss_curve: Vec<f32>,
}

impl MlpClassifier {
    /// Creates a new unfitted `MlpClassifier`.
    ///
    /// # Arguments
    /// * `spec` - The classifier's hyperparameters.
    /// * `n_features` - The amount of inputs per sample.
    /// * `n_classes` - The amount of classes, at least 2.
    ///
    /// # Returns
    /// A new `MlpClassifier` or an error if the spec or the dimensions are invalid.
    pub fn new(spec: ClassifierSpec, n_features: usize, n_classes: usize) -> Result<Self> {
        spec.validate()?;

        if n_features == 0 {
            return Err(MlErr::InvalidSpec("n_features must be greater than 0".into()));
        }

        if n_classes < 2 {
            return Err(MlErr::InvalidSpec(format!(
                "a classifier needs at least 2 classes, got {n_classes}"
            )));
        }

        let act_fn = spec.activation.resolve();
        let mut layers = Vec::with_capacity(spec.hidden_layers.len() + 1);
        let mut n_in = n_features;

        for n_out in spec.hidden_layers.iter().map(|n| n.get()) {
            layers.push(Layer::dense((n_in, n_out), Some(act_fn)));
            n_in = n_out;
        }
        layers.push(Layer::dense((n_in, n_classes), None));

        Ok(Self {
            spec,
            model: Sequential::new(layers),
            n_features,
            n_classes,
            params: None,
            loss_curve: Vec::new(),
        })
    }

    pub fn spec(&self) -> &ClassifierSpec {
        &self.spec
    }

    /// The underlying model, its layout is the layout of `params`.
    pub fn model(&self) -> &Sequential {
        &self.model
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_params(&self) -> usize {
        self.model.size()
    }

    /// The current parameters, `None` before the classifier is initialized.
    pub fn params(&self) -> Option<&[f32]> {
        self.params.as_deref()
    }

    /// Replaces the parameters.
    ///
    /// # Arguments
    /// * `params` - The new parameters, exactly `n_params()` values.
    pub fn set_params(&mut self, params: &[f32]) -> Result<()> {
        if params.len() != self.n_params() {
            return Err(MlErr::SizeMismatch {
                what: "classifier params",
                got: params.len(),
                expected: self.n_params(),
            });
        }

        self.params = Some(params.to_vec());
        Ok(())
    }

    /// The training loss of every epoch of the last `fit`.
    pub fn loss_curve(&self) -> &[f32] {
        &self.loss_curve
    }

    /// The amount of epochs the last `fit` ran.
    pub fn n_iter(&self) -> usize {
        self.loss_curve.len()
    }

    /// Draws random initial parameters without training.
    pub fn initialize(&mut self) -> Result<()> {
        let rng = Rc::new(RefCell::new(seeded_rng(self.spec.seed)));
        self.params = Some(init_sequential(&self.model, self.spec.init, rng)?);
        Ok(())
    }

    /// Trains the classifier from freshly initialized parameters.
    ///
    /// Training runs until `max_iter` epochs or until the epoch loss fails to improve by
    /// `tol` over the best loss for more than `n_iter_no_change` consecutive epochs.
    ///
    /// # Arguments
    /// * `dataset` - The training data, with `n_features` features and `n_classes` one-hot targets.
    ///
    /// # Returns
    /// The fitted classifier, ready to `predict` or `score`.
    pub fn fit(&mut self, dataset: &Dataset) -> Result<&mut Self> {
        self.check_dataset(dataset)?;

        let rng = Rc::new(RefCell::new(seeded_rng(self.spec.seed)));
        let mut params = init_sequential(&self.model, self.spec.init, Rc::clone(&rng))?;
        let shuffle_rng = StdRng::from_rng(&mut *rng.borrow_mut());

        let batch_size = NonZeroUsize::new(dataset.len())
            .map(|len| self.spec.batch_size.min(len))
            .ok_or_else(|| MlErr::InvalidDataset("cannot fit an empty dataset".into()))?;

        let n = params.len();
        let loss_curve = match self.spec.solver {
            SolverSpec::Sgd {
                learning_rate,
                momentum,
            } if momentum == 0. => {
                let optimizer = GradientDescent::new(learning_rate);
                self.run_epochs(optimizer, dataset, batch_size, shuffle_rng, &mut params)?
            }
            SolverSpec::Sgd {
                learning_rate,
                momentum,
            } => {
                let optimizer = GradientDescentWithMomentum::new(n, learning_rate, momentum);
                self.run_epochs(optimizer, dataset, batch_size, shuffle_rng, &mut params)?
            }
            SolverSpec::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => {
                let optimizer = Adam::new(n, learning_rate, beta1, beta2, epsilon);
                self.run_epochs(optimizer, dataset, batch_size, shuffle_rng, &mut params)?
            }
        };

        info!(
            epochs = loss_curve.len(),
            loss = loss_curve.last().copied().unwrap_or_default();
            "fitted classifier"
        );

        self.params = Some(params);
        self.loss_curve = loss_curve;
        Ok(self)
    }

    /// Predicts the class of every row of `x`.
    ///
    /// # Returns
    /// One class per row, or `NotFitted` before the classifier has parameters.
    pub fn predict(&mut self, x: ArrayView2<f32>) -> Result<Vec<usize>> {
        let params = self.params.as_deref().ok_or(MlErr::NotFitted)?;
        self.model.predict(params, x)
    }

    /// The mean accuracy on `dataset`.
    pub fn score(&mut self, dataset: &Dataset) -> Result<f32> {
        self.check_dataset(dataset)?;
        let pred = self.predict(dataset.x())?;
        metrics::accuracy(&pred, &dataset.labels())
    }

    fn run_epochs<O: Optimizer>(
        &self,
        optimizer: O,
        dataset: &Dataset,
        batch_size: NonZeroUsize,
        rng: StdRng,
        params: &mut [f32],
    ) -> Result<Vec<f32>> {
        let mut trainer = ModelTrainer::new(
            self.model.clone(),
            optimizer,
            CrossEntropy,
            dataset.clone(),
            batch_size,
            rng,
        );

        let max_iter = self.spec.max_iter.get();
        let patience = self.spec.n_iter_no_change.get();
        let mut losses = Vec::with_capacity(max_iter);
        let mut best_loss = f32::INFINITY;
        let mut no_improvement = 0;

        for epoch in 0..max_iter {
            let loss = trainer.train_epoch(params)?;
            losses.push(loss);
            debug!(epoch = epoch, loss = loss; "finished epoch");

            if !loss.is_finite() {
                warn!(epoch = epoch; "training diverged, stopping");
                break;
            }

            if loss > best_loss - self.spec.tol {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            best_loss = best_loss.min(loss);

            if no_improvement > patience {
                debug!(epoch = epoch; "loss stopped improving");
                return Ok(losses);
            }
        }

        if losses.len() == max_iter {
            warn!(max_iter = max_iter; "reached max_iter before the loss converged");
        }

        Ok(losses)
    }

    fn check_dataset(&self, dataset: &Dataset) -> Result<()> {
        if dataset.x_size() != self.n_features {
            return Err(MlErr::SizeMismatch {
                what: "dataset features",
                got: dataset.x_size(),
                expected: self.n_features,
            });
        }

        if dataset.y_size() != self.n_classes {
            return Err(MlErr::SizeMismatch {
                what: "dataset classes",
                got: dataset.y_size(),
                expected: self.n_classes,
            });
        }

        Ok(())
    }
}
