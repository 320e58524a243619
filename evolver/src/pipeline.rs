//! The end to end run: load, split, fit, score, evolve and score again.

use evolution::{ClassifierFitness, GeneticAlgorithm};
use log::{debug, info};
use machine_learning::{Dataset, MlErr, MlpClassifier, digits, metrics};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    Result,
    config::{DatasetSpec, RunConfig},
    report::{DatasetSizes, FitReport, RunReport, Scores},
};

/// The three disjoint sides of the data.
struct Splits {
    fit: Dataset,
    validation: Dataset,
    test: Dataset,
}

impl Splits {
    fn sizes(&self) -> DatasetSizes {
        DatasetSizes {
            fit: self.fit.len(),
            validation: self.validation.len(),
            test: self.test.len(),
        }
    }
}

/// Runs the whole pipeline.
///
/// # Arguments
/// * `config` - The run configuration.
///
/// # Returns
/// The scores before and after the evolution together with its history.
pub fn run(config: &RunConfig) -> Result<RunReport> {
    config.validate()?;

    let splits = prepare(config)?;
    let (mut clf, baseline) = fit_baseline(config, &splits)?;
    let initial = clf.params().ok_or(MlErr::NotFitted)?.to_vec();

    let mut fitness = ClassifierFitness::new(clf.model().clone(), splits.validation.clone());
    if let Some(refinement) = config.refinement {
        info!(epochs = refinement.epochs.get(); "refining every genome before scoring it");
        fitness = fitness.with_refinement(refinement, splits.fit.clone());
    }

    let ga = GeneticAlgorithm::new(config.genetic.clone())?;
    info!(
        population = ga.config().population_size,
        genes = initial.len(),
        max_generations = ga.config().max_generations;
        "starting evolution"
    );
    let evolution = ga.run(initial, &fitness)?;

    clf.set_params(evolution.best.genes())?;
    let evolved = score(&mut clf, &splits)?;
    info!(
        test_accuracy = evolved.test_accuracy,
        baseline_test_accuracy = baseline.test_accuracy;
        "evolved classifier scored"
    );

    let pred = clf.predict(splits.test.x())?;
    let confusion_matrix =
        metrics::confusion_matrix(&pred, &splits.test.labels(), clf.n_classes())?;

    Ok(RunReport {
        sizes: splits.sizes(),
        baseline,
        evolved,
        loss_curve: clf.loss_curve().to_vec(),
        history: evolution.history,
        termination: evolution.termination,
        evaluations: evolution.evaluations,
        confusion_matrix,
    })
}

/// Runs the pipeline up to the fitted classifier's scores.
pub fn fit_only(config: &RunConfig) -> Result<FitReport> {
    config.validate()?;

    let splits = prepare(config)?;
    let (clf, baseline) = fit_baseline(config, &splits)?;

    Ok(FitReport {
        sizes: splits.sizes(),
        baseline,
        loss_curve: clf.loss_curve().to_vec(),
    })
}

/// Loads the dataset, scales the pixels into `[0, 1]` and splits it.
fn prepare(config: &RunConfig) -> Result<Splits> {
    let mut rng = StdRng::seed_from_u64(config.split_seed);

    let mut dataset = match &config.dataset {
        DatasetSpec::Digits { path } => {
            info!("loading digits from {}", path.display());
            digits::load(path)?
        }
        DatasetSpec::Synthetic {
            samples_per_class,
            noise,
        } => {
            info!(samples_per_class = samples_per_class.get(), noise = *noise; "generating synthetic digits");
            digits::synthetic(samples_per_class.get(), *noise, &mut rng)?
        }
    };
    dataset.scale_features(1. / digits::MAX_PIXEL);

    let (train, test) = dataset.split(config.test_size, &mut rng)?;
    let (fit, validation) = train.split(config.validation_size, &mut rng)?;

    let splits = Splits {
        fit,
        validation,
        test,
    };
    let sizes = splits.sizes();
    info!(
        fit = sizes.fit,
        validation = sizes.validation,
        test = sizes.test;
        "split dataset"
    );

    Ok(splits)
}

fn fit_baseline(config: &RunConfig, splits: &Splits) -> Result<(MlpClassifier, Scores)> {
    let mut clf = MlpClassifier::new(
        config.classifier.clone(),
        splits.fit.x_size(),
        splits.fit.y_size(),
    )?;
    debug!(params = clf.n_params(); "built classifier");

    clf.fit(&splits.fit)?;
    let baseline = score(&mut clf, splits)?;
    info!(
        epochs = clf.n_iter(),
        train_accuracy = baseline.train_accuracy,
        test_accuracy = baseline.test_accuracy;
        "baseline classifier scored"
    );

    Ok((clf, baseline))
}

fn score(clf: &mut MlpClassifier, splits: &Splits) -> Result<Scores> {
    Ok(Scores {
        train_accuracy: clf.score(&splits.fit)?,
        validation_accuracy: clf.score(&splits.validation)?,
        test_accuracy: clf.score(&splits.test)?,
    })
}
