#![cfg(test)]

use std::{cell::RefCell, num::NonZeroUsize, rc::Rc};

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    arch::{
        Model, Sequential,
        activations::ActFn,
        layers::Layer,
        loss::{CrossEntropy, LossFn, Mse},
    },
    dataset::Dataset,
    initialization::{WeightInit, init_sequential},
    metrics,
    optimization::{Adam, GradientDescent},
    training::ModelTrainer,
};

fn gate_dataset(rows: &[[f32; 3]]) -> Dataset {
    Dataset::new(rows.iter().flatten().copied().collect(), 2, 1).unwrap()
}

#[test]
fn test_ml_and2_gate_convergence() {
    let and2 = [
        [0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 1.0],
    ];
    let dataset = gate_dataset(&and2);

    let model = Sequential::new([
        Layer::dense((2, 3), Some(ActFn::sigmoid(1.))),
        Layer::dense((3, 1), Some(ActFn::sigmoid(1.))),
    ]);
    let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(11)));
    let mut params = init_sequential(&model, WeightInit::default(), rng).unwrap();

    let batch_size = NonZeroUsize::new(4).unwrap();
    let mut trainer = ModelTrainer::new(
        model,
        GradientDescent::new(5.),
        Mse,
        dataset.clone(),
        batch_size,
        StdRng::seed_from_u64(12),
    );
    let losses = trainer.train(&mut params, 3000).unwrap();
    assert!(losses.last().unwrap() < losses.first().unwrap());

    let mut model = trainer.into_model();
    let y_pred = model.forward(&params, dataset.x()).unwrap();
    let err = Mse.loss(y_pred.view(), dataset.y());

    assert!(err < 0.05, "err: {err}");
}

#[test]
fn test_ml_xor2_gate_convergence() {
    let xor2 = [
        [0.0, 0.0, 0.0],
        [0.0, 1.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 0.0],
    ];
    let dataset = gate_dataset(&xor2);

    let model = Sequential::new([
        Layer::dense((2, 4), Some(ActFn::Tanh)),
        Layer::dense((4, 1), Some(ActFn::sigmoid(1.))),
    ]);
    let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(21)));
    let mut params = init_sequential(&model, WeightInit::default(), rng).unwrap();

    let batch_size = NonZeroUsize::new(4).unwrap();
    let optimizer = Adam::new(params.len(), 0.05, 0.9, 0.999, 1e-8);
    let mut trainer = ModelTrainer::new(
        model,
        optimizer,
        Mse,
        dataset.clone(),
        batch_size,
        StdRng::seed_from_u64(22),
    );
    trainer.train(&mut params, 2000).unwrap();

    let y_pred = trainer
        .model_mut()
        .forward(&params, dataset.x())
        .unwrap();

    for (pred, expected) in y_pred.iter().zip(dataset.y()) {
        assert!((pred - expected).abs() < 0.2, "{pred} vs {expected}");
    }
}

#[test]
fn test_ml_one_hot_classification_with_cross_entropy() {
    let features = vec![
        0.0, 0.0, //
        0.1, 0.2, //
        1.0, 1.0, //
        0.9, 0.8, //
        0.0, 1.0, //
        0.1, 0.9, //
    ];
    let labels = [0, 0, 1, 1, 2, 2];
    let dataset = Dataset::from_labels(features, &labels, 2, 3).unwrap();

    let model = Sequential::new([
        Layer::dense((2, 6), Some(ActFn::Relu)),
        Layer::dense((6, 3), None),
    ]);
    let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(31)));
    let mut params = init_sequential(&model, WeightInit::default(), rng).unwrap();

    let batch_size = NonZeroUsize::new(3).unwrap();
    let optimizer = Adam::new(params.len(), 0.05, 0.9, 0.999, 1e-8);
    let mut trainer = ModelTrainer::new(
        model,
        optimizer,
        CrossEntropy,
        dataset.clone(),
        batch_size,
        StdRng::seed_from_u64(32),
    );
    trainer.train(&mut params, 500).unwrap();

    let pred = trainer.model_mut().predict(&params, dataset.x()).unwrap();
    assert_eq!(metrics::accuracy(&pred, &labels).unwrap(), 1.);
}
