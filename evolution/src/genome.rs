use serde::{Deserialize, Serialize};

/// An individual of the population.
///
/// The genes are a flat parameter vector in the layout of the model being evolved, the
/// fitness is `None` until the individual is evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    genes: Vec<f32>,
    fitness: Option<f32>,
}

impl Genome {
    /// Creates a new unevaluated `Genome`.
    pub fn new(genes: Vec<f32>) -> Self {
        Self {
            genes,
            fitness: None,
        }
    }

    pub fn genes(&self) -> &[f32] {
        &self.genes
    }

    /// Gives mutable access to the genes, the fitness is cleared since it no longer applies.
    pub fn genes_mut(&mut self) -> &mut [f32] {
        self.fitness = None;
        &mut self.genes
    }

    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    /// The fitness used for ranking: unevaluated and NaN individuals rank last.
    pub fn rank(&self) -> f32 {
        match self.fitness {
            Some(f) if !f.is_nan() => f,
            _ => f32::NEG_INFINITY,
        }
    }

    pub(crate) fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }
}
