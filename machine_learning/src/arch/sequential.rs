use ndarray::{Array2, ArrayView2};

use super::{Model, layers::Layer, loss::LossFn};
use crate::{MlErr, Result, metrics, optimization::Optimizer};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
///
/// The model holds no parameters, every pass reads them from a single flat slice where the
/// layers' parameters are laid out one after the other.
#[derive(Clone, Debug)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Predicts the class of each row of `x` as the index of its largest output.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The input data.
    ///
    /// # Returns
    /// One class index per row.
    pub fn predict(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Vec<usize>> {
        let y_pred = self.forward(params, x)?;
        Ok(metrics::argmax_rows(y_pred.view()))
    }

    /// Computes the gradient of the loss over a single batch without touching `params`.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `grad` - Where to write the gradient, must be as long as `params`.
    /// * `x` - The input batch.
    /// * `y` - The expected output batch.
    /// * `loss_fn` - The loss function.
    ///
    /// # Returns
    /// The batch loss.
    pub fn compute_grad<L: LossFn>(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        x: ArrayView2<f32>,
        y: ArrayView2<f32>,
        loss_fn: &L,
    ) -> Result<f32> {
        if grad.len() != params.len() {
            return Err(MlErr::SizeMismatch {
                what: "gradient",
                got: grad.len(),
                expected: params.len(),
            });
        }

        let y_pred = self.forward(params, x)?;
        if y_pred.dim() != y.dim() {
            return Err(MlErr::SizeMismatch {
                what: "targets",
                got: y.len(),
                expected: y_pred.len(),
            });
        }

        let loss = loss_fn.loss(y_pred.view(), y);
        let mut d = loss_fn.loss_prime(y_pred.view(), y);

        let mut end = params.len();
        for layer in self.layers.iter_mut().rev() {
            let start = end - layer.size();
            d = layer.backward(&params[start..end], &mut grad[start..end], d)?;
            end = start;
        }

        Ok(loss)
    }

    fn check_params(&self, got: usize) -> Result<()> {
        let expected = self.size();
        if got != expected {
            return Err(MlErr::SizeMismatch {
                what: "params",
                got,
                expected,
            });
        }

        Ok(())
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.layers.iter().map(|layer| layer.size()).sum()
    }

    fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_params(params.len())?;

        let mut offset = 0;
        let mut a: Option<Array2<f32>> = None;

        for layer in self.layers.iter_mut() {
            let size = layer.size();
            let layer_params = &params[offset..offset + size];
            offset += size;

            let next = match &a {
                Some(prev) => layer.forward(layer_params, prev.view())?,
                None => layer.forward(layer_params, x.view())?,
            };
            a = Some(next);
        }

        a.ok_or_else(|| MlErr::InvalidSpec("the model has no layers".into()))
    }

    // NOTE: since getting the actual loss would require forwarding over all batches again at
    // the end of the backprop iterations, we are approximating it by averaging the loss at
    // each batch.
    fn backprop<'a, O, L, I>(
        &mut self,
        params: &mut [f32],
        grad: &mut [f32],
        optimizer: &mut O,
        loss_fn: &L,
        batches: I,
    ) -> Result<f32>
    where
        O: Optimizer,
        L: LossFn,
        I: Iterator<Item = (ArrayView2<'a, f32>, ArrayView2<'a, f32>)>,
    {
        let mut total_loss = 0.0;
        let mut num_batches = 0;

        for (x, y) in batches {
            total_loss += self.compute_grad(params, grad, x, y, loss_fn)?;
            num_batches += 1;
            optimizer.update_params(grad, params)?;
        }

        if num_batches == 0 {
            return Err(MlErr::InvalidDataset("there are no batches to train on".into()));
        }

        Ok(total_loss / num_batches as f32)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        arch::{activations::ActFn, loss::CrossEntropy},
        initialization::{WeightInit, init_sequential},
        optimization::GradientDescent,
    };

    fn small_model() -> Sequential {
        Sequential::new([
            Layer::dense((3, 4), Some(ActFn::Tanh)),
            Layer::dense((4, 2), None),
        ])
    }

    #[test]
    fn size_is_the_sum_of_the_layers() {
        assert_eq!(small_model().size(), 4 * 4 + 5 * 2);
    }

    #[test]
    fn forward_rejects_wrong_param_count() {
        let mut model = small_model();
        let x = array![[1., 2., 3.]];

        assert!(matches!(
            model.forward(&[0.; 3], x.view()),
            Err(MlErr::SizeMismatch { what: "params", .. })
        ));
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let mut model = small_model();
        let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(7)));
        let mut params = init_sequential(&model, WeightInit::default(), rng).unwrap();
        params.iter_mut().enumerate().for_each(|(i, p)| *p += 0.01 * i as f32);

        let x = array![[0.5, -1., 0.25], [1., 0., -0.5]];
        let y = array![[1., 0.], [0., 1.]];

        let mut grad = vec![0.; params.len()];
        model
            .compute_grad(&params, &mut grad, x.view(), y.view(), &CrossEntropy)
            .unwrap();

        let h = 1e-2;
        for i in 0..params.len() {
            let mut plus = params.clone();
            plus[i] += h;
            let mut minus = params.clone();
            minus[i] -= h;

            let loss_plus = CrossEntropy.loss(model.forward(&plus, x.view()).unwrap().view(), y.view());
            let loss_minus =
                CrossEntropy.loss(model.forward(&minus, x.view()).unwrap().view(), y.view());
            let numeric = (loss_plus - loss_minus) / (2. * h);

            assert!(
                (numeric - grad[i]).abs() < 2e-3,
                "param {i}: numeric {numeric} vs analytic {}",
                grad[i]
            );
        }
    }

    #[test]
    fn backprop_lowers_the_loss() {
        let mut model = small_model();
        let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(3)));
        let mut params = init_sequential(&model, WeightInit::default(), rng).unwrap();
        let mut grad = vec![0.; params.len()];
        let mut optimizer = GradientDescent::new(0.5);

        let x = array![[1., 0., 0.], [0., 1., 0.], [0., 0., 1.], [1., 1., 0.]];
        let y = array![[1., 0.], [0., 1.], [1., 0.], [0., 1.]];

        let first = model
            .backprop(
                &mut params,
                &mut grad,
                &mut optimizer,
                &CrossEntropy,
                std::iter::once((x.view(), y.view())),
            )
            .unwrap();

        let mut last = first;
        for _ in 0..50 {
            last = model
                .backprop(
                    &mut params,
                    &mut grad,
                    &mut optimizer,
                    &CrossEntropy,
                    std::iter::once((x.view(), y.view())),
                )
                .unwrap();
        }

        assert!(last < first);
    }
}
