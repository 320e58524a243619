use ndarray::{Array2, ArrayView2};

use super::LossFn;

const EPS: f32 = 1e-12;

/// Row-wise softmax, shifted by each row's maximum so large logits don't overflow.
pub fn softmax(logits: ArrayView2<f32>) -> Array2<f32> {
    let mut probs = logits.to_owned();

    for mut row in probs.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }

    probs
}

/// Softmax cross-entropy over raw logits against one-hot targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for CrossEntropy {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        let n = y_pred.nrows().max(1) as f32;
        let probs = softmax(y_pred);

        let total: f32 = probs
            .iter()
            .zip(y.iter())
            .filter(|&(_, &t)| t > 0.)
            .map(|(&p, &t)| -t * p.max(EPS).ln())
            .sum();

        total / n
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        let n = y_pred.nrows().max(1) as f32;
        (softmax(y_pred) - &y) / n
    }
}
