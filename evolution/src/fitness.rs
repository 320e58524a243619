use std::num::NonZeroUsize;

use machine_learning::{
    Dataset, MlErr,
    arch::{Model, Sequential, loss::CrossEntropy},
    metrics,
    optimization::GradientDescent,
    training::ModelTrainer,
};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

const DEFAULT_EPOCHS: NonZeroUsize = NonZeroUsize::new(1).unwrap();
const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(32).unwrap();

/// Scores a genome, higher is better.
///
/// Evaluations run concurrently, so implementations must be `Sync` and must give the same
/// result for the same genes. An implementation may rewrite the genes before scoring them,
/// the rewritten genes are what survives into the next generation.
pub trait Fitness: Sync {
    /// Evaluates a genome.
    ///
    /// # Arguments
    /// * `genes` - The genome's genes, may be refined in place.
    ///
    /// # Returns
    /// The fitness of the (possibly refined) genes. A NaN is ranked as the worst fitness.
    fn evaluate(&self, genes: &mut [f32]) -> Result<f32, MlErr>;
}

/// Adapts a closure into a `Fitness`.
pub struct FnFitness<F>(F);

impl<F> FnFitness<F>
where
    F: Fn(&[f32]) -> f32 + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Fitness for FnFitness<F>
where
    F: Fn(&[f32]) -> f32 + Sync,
{
    fn evaluate(&self, genes: &mut [f32]) -> Result<f32, MlErr> {
        Ok((self.0)(genes))
    }
}

/// Local search applied to every genome before scoring it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Refinement {
    pub epochs: NonZeroUsize,
    pub learning_rate: f32,
    pub batch_size: NonZeroUsize,
    pub seed: u64,
}

impl Default for Refinement {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            learning_rate: 0.01,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: 0,
        }
    }
}

/// The accuracy of a classification model over a held-out dataset.
///
/// With a `Refinement`, every genome first gets a few seeded epochs of gradient descent on
/// a separate training set. The refined weights are written back into the genome.
pub struct ClassifierFitness {
    template: Sequential,
    data: Dataset,
    labels: Vec<usize>,
    refinement: Option<(Refinement, Dataset)>,
}

impl ClassifierFitness {
    /// Creates a new `ClassifierFitness`.
    ///
    /// # Arguments
    /// * `template` - The model whose parameter layout the genes follow.
    /// * `data` - The dataset the accuracy is measured on.
    pub fn new(template: Sequential, data: Dataset) -> Self {
        let labels = data.labels();

        Self {
            template,
            data,
            labels,
            refinement: None,
        }
    }

    /// Refines every genome on `train` before scoring it.
    pub fn with_refinement(mut self, refinement: Refinement, train: Dataset) -> Self {
        self.refinement = Some((refinement, train));
        self
    }

    /// The amount of genes a genome must have.
    pub fn genome_len(&self) -> usize {
        self.template.size()
    }

    fn refine(&self, model: Sequential, genes: &mut [f32]) -> Result<Sequential, MlErr> {
        let Some((refinement, train)) = &self.refinement else {
            return Ok(model);
        };

        let mut trainer = ModelTrainer::new(
            model,
            GradientDescent::new(refinement.learning_rate),
            CrossEntropy,
            train.clone(),
            refinement.batch_size,
            StdRng::seed_from_u64(refinement.seed),
        );
        trainer.train(genes, refinement.epochs.get())?;

        Ok(trainer.into_model())
    }
}

impl Fitness for ClassifierFitness {
    fn evaluate(&self, genes: &mut [f32]) -> Result<f32, MlErr> {
        let model = self.template.clone();
        let mut model = self.refine(model, genes)?;

        let pred = model.predict(genes, self.data.x())?;
        metrics::accuracy(&pred, &self.labels)
    }
}

#[cfg(test)]
mod tests {
    use machine_learning::arch::layers::Layer;

    use super::*;

    fn xor() -> Dataset {
        Dataset::from_labels(vec![0., 0., 0., 1., 1., 0., 1., 1.], &[0, 1, 1, 0], 2, 2).unwrap()
    }

    fn linear() -> Sequential {
        Sequential::new([Layer::dense((2, 2), None)])
    }

    #[test]
    fn closures_are_fitness_functions() {
        let fitness = FnFitness::new(|genes: &[f32]| -genes.iter().map(|g| g * g).sum::<f32>());
        assert_eq!(fitness.evaluate(&mut [1., 2.]).unwrap(), -5.);
    }

    #[test]
    fn accuracy_of_the_given_weights() {
        let data = Dataset::from_labels(vec![1., 0., 0., 1.], &[0, 1], 2, 2).unwrap();
        let fitness = ClassifierFitness::new(linear(), data);

        // identity weights, zero biases
        let mut right = [1., 0., 0., 1., 0., 0.];
        let mut wrong = [0., 1., 1., 0., 0., 0.];

        assert_eq!(fitness.genome_len(), 6);
        assert_eq!(fitness.evaluate(&mut right).unwrap(), 1.);
        assert_eq!(fitness.evaluate(&mut wrong).unwrap(), 0.);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let fitness = ClassifierFitness::new(linear(), xor()).with_refinement(
            Refinement {
                epochs: NonZeroUsize::new(3).unwrap(),
                learning_rate: 0.5,
                batch_size: NonZeroUsize::new(2).unwrap(),
                seed: 9,
            },
            xor(),
        );

        let mut a = vec![0.1, -0.2, 0.3, 0.05, 0., 0.];
        let mut b = a.clone();

        assert_eq!(fitness.evaluate(&mut a).unwrap(), fitness.evaluate(&mut b).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn refinement_writes_the_genes_back() {
        let fitness =
            ClassifierFitness::new(linear(), xor()).with_refinement(Refinement::default(), xor());
        let original = vec![0.1, -0.2, 0.3, 0.05, 0., 0.];
        let mut genes = original.clone();

        fitness.evaluate(&mut genes).unwrap();
        assert_ne!(genes, original);
    }

    #[test]
    fn wrong_genome_length_fails() {
        let fitness = ClassifierFitness::new(linear(), xor());
        assert!(matches!(
            fitness.evaluate(&mut [0.; 3]),
            Err(MlErr::SizeMismatch { .. })
        ));
    }
}
