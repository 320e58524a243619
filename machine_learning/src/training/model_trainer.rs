use std::num::NonZeroUsize;

use log::trace;
use rand::Rng;

use crate::{
    Result,
    arch::{Model, loss::LossFn},
    dataset::Dataset,
    optimization::Optimizer,
};

/// A model trainer. Contains the relevant components needed for training a model,
/// including the model itself.
pub struct ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    model: M,
    optimizer: O,
    loss_fn: L,
    dataset: Dataset,
    batch_size: NonZeroUsize,
    rng: R,
    grad: Vec<f32>,
}

impl<M, O, L, R> ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    /// Returns a new `ModelTrainer`.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `optimizer` - The optimizer, sized for the model's parameters.
    /// * `loss_fn` - The loss function used to measure the difference between a model's output and the expected one.
    /// * `dataset` - The dataset the model will be trained with.
    /// * `batch_size` - The amount of samples per parameter update.
    /// * `rng` - A random number generator, used to shuffle the dataset every epoch.
    pub fn new(
        model: M,
        optimizer: O,
        loss_fn: L,
        dataset: Dataset,
        batch_size: NonZeroUsize,
        rng: R,
    ) -> Self {
        let grad = vec![0.; model.size()];

        Self {
            model,
            optimizer,
            loss_fn,
            dataset,
            batch_size,
            rng,
            grad,
        }
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Consumes the trainer, giving back its model.
    pub fn into_model(self) -> M {
        self.model
    }

    /// Performs a single epoch: shuffles the dataset and runs backprop over its batches.
    ///
    /// # Arguments
    /// * `params` - The model's parameters, updated in place.
    ///
    /// # Returns
    /// The epoch loss, the mean of the batch losses.
    pub fn train_epoch(&mut self, params: &mut [f32]) -> Result<f32> {
        self.dataset.shuffle(&mut self.rng);
        let batches = self.dataset.batches(self.batch_size);

        self.model.backprop(
            params,
            &mut self.grad,
            &mut self.optimizer,
            &self.loss_fn,
            batches,
        )
    }

    /// Performs `epochs` epochs of training.
    ///
    /// # Arguments
    /// * `params` - The model's parameters, updated in place.
    /// * `epochs` - The amount of passes over the dataset.
    ///
    /// # Returns
    /// The loss of every epoch.
    pub fn train(&mut self, params: &mut [f32], epochs: usize) -> Result<Vec<f32>> {
        let mut losses = Vec::with_capacity(epochs);

        for epoch in 0..epochs {
            let loss = self.train_epoch(params)?;
            trace!(epoch = epoch, loss = loss; "finished epoch");
            losses.push(loss);
        }

        Ok(losses)
    }
}
