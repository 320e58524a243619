use std::num::NonZeroUsize;

use ndarray::{Array2, ArrayView2, Axis, s};
use rand::{Rng, seq::SliceRandom};

use crate::{MlErr, Result, metrics};

/// An in-memory supervised dataset.
///
/// Every row holds `x_size` features followed by `y_size` targets. Class labels are stored
/// one-hot encoded in the target columns.
#[derive(Clone, Debug)]
pub struct Dataset {
    data: Array2<f32>,
    x_size: usize,
    y_size: usize,
}

impl Dataset {
    /// Creates a new `Dataset` from row-major samples.
    ///
    /// # Arguments
    /// * `data` - The samples, each one `x_size + y_size` values long.
    /// * `x_size` - The amount of features per sample.
    /// * `y_size` - The amount of targets per sample.
    ///
    /// # Returns
    /// The dataset or an error if the data doesn't split into whole, non-empty rows.
    pub fn new(data: Vec<f32>, x_size: usize, y_size: usize) -> Result<Self> {
        if x_size == 0 || y_size == 0 {
            return Err(MlErr::InvalidDataset(
                "x_size and y_size must be greater than 0".into(),
            ));
        }

        let row_size = x_size + y_size;
        if data.len() % row_size != 0 {
            return Err(MlErr::InvalidDataset(format!(
                "dataset length ({}) is not divisible by x_size + y_size ({row_size})",
                data.len()
            )));
        }

        let rows = data.len() / row_size;
        if rows == 0 {
            return Err(MlErr::InvalidDataset(
                "dataset must have at least one sample".into(),
            ));
        }

        let data = Array2::from_shape_vec((rows, row_size), data)?;
        Ok(Self {
            data,
            x_size,
            y_size,
        })
    }

    /// Creates a new `Dataset` by one-hot encoding class labels.
    ///
    /// # Arguments
    /// * `features` - The row-major feature matrix.
    /// * `labels` - One class index per sample.
    /// * `x_size` - The amount of features per sample.
    /// * `n_classes` - The amount of classes, every label must be lower.
    pub fn from_labels(
        features: Vec<f32>,
        labels: &[usize],
        x_size: usize,
        n_classes: usize,
    ) -> Result<Self> {
        if x_size == 0 || features.len() != labels.len() * x_size {
            return Err(MlErr::SizeMismatch {
                what: "features",
                got: features.len(),
                expected: labels.len() * x_size,
            });
        }

        let mut data = Vec::with_capacity(labels.len() * (x_size + n_classes));
        for (row, &label) in features.chunks_exact(x_size).zip(labels) {
            if label >= n_classes {
                return Err(MlErr::InvalidDataset(format!(
                    "label {label} is out of range for {n_classes} classes"
                )));
            }

            data.extend_from_slice(row);
            data.extend((0..n_classes).map(|c| if c == label { 1. } else { 0. }));
        }

        Self::new(data, x_size, n_classes)
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn x_size(&self) -> usize {
        self.x_size
    }

    pub fn y_size(&self) -> usize {
        self.y_size
    }

    /// The feature matrix, one sample per row.
    pub fn x(&self) -> ArrayView2<'_, f32> {
        self.data.slice(s![.., ..self.x_size])
    }

    /// The target matrix, one sample per row.
    pub fn y(&self) -> ArrayView2<'_, f32> {
        self.data.slice(s![.., self.x_size..])
    }

    /// The class of every sample, decoded from the one-hot targets.
    pub fn labels(&self) -> Vec<usize> {
        metrics::argmax_rows(self.y())
    }

    /// Multiplies every feature by `factor`, targets are left untouched.
    pub fn scale_features(&mut self, factor: f32) {
        self.data
            .slice_mut(s![.., ..self.x_size])
            .mapv_inplace(|v| v * factor);
    }

    /// Randomly permutes the samples.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);
        self.data = self.data.select(Axis(0), &order);
    }

    /// Iterates the dataset in batches of `batch_size` samples, the last one may be shorter.
    ///
    /// # Returns
    /// An iterator of `(x, y)` views.
    pub fn batches(
        &self,
        batch_size: NonZeroUsize,
    ) -> impl Iterator<Item = (ArrayView2<'_, f32>, ArrayView2<'_, f32>)> {
        let x_size = self.x_size;

        self.data
            .axis_chunks_iter(Axis(0), batch_size.get())
            .map(move |chunk| chunk.split_at(Axis(1), x_size))
    }

    /// Splits the samples at random into a train and a test dataset.
    ///
    /// # Arguments
    /// * `test_size` - The fraction of samples that goes to the test side, in `(0, 1)`. The
    ///   amount of test samples is rounded up.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// A `(train, test)` tuple or an error if either side would be empty.
    pub fn split<R: Rng + ?Sized>(&self, test_size: f32, rng: &mut R) -> Result<(Self, Self)> {
        if !(test_size > 0. && test_size < 1.) {
            return Err(MlErr::InvalidDataset(format!(
                "test_size must be in (0, 1), got {test_size}"
            )));
        }

        let n = self.len();
        let n_test = (test_size * n as f32).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(MlErr::InvalidDataset(format!(
                "cannot split {n} samples with test_size {test_size}"
            )));
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        let (test_idx, train_idx) = order.split_at(n_test);

        Ok((self.subset(train_idx), self.subset(test_idx)))
    }

    fn subset(&self, idx: &[usize]) -> Self {
        Self {
            data: self.data.select(Axis(0), idx),
            x_size: self.x_size,
            y_size: self.y_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn counting(rows: usize) -> Dataset {
        let features = (0..rows).map(|i| i as f32).collect();
        let labels: Vec<usize> = (0..rows).map(|i| i % 2).collect();
        Dataset::from_labels(features, &labels, 1, 2).unwrap()
    }

    #[test]
    fn creating_an_invalid_dataset_fails() {
        assert!(Dataset::new(vec![1., 2., 3.], 1, 1).is_err());
        assert!(Dataset::new(vec![], 1, 1).is_err());
        assert!(Dataset::new(vec![1., 2.], 2, 0).is_err());
    }

    #[test]
    fn labels_are_one_hot_encoded() {
        let ds = Dataset::from_labels(vec![0.5, 0.25], &[2, 0], 1, 3).unwrap();

        assert_eq!(ds.y().row(0).to_vec(), [0., 0., 1.]);
        assert_eq!(ds.y().row(1).to_vec(), [1., 0., 0.]);
        assert_eq!(ds.labels(), [2, 0]);
    }

    #[test]
    fn out_of_range_label_fails() {
        assert!(Dataset::from_labels(vec![0.5], &[3], 1, 3).is_err());
    }

    #[test]
    fn batches_cover_every_sample() {
        let ds = counting(5);
        let batch_size = NonZeroUsize::new(2).unwrap();

        let sizes: Vec<usize> = ds.batches(batch_size).map(|(x, _)| x.nrows()).collect();
        assert_eq!(sizes, [2, 2, 1]);

        let (x, y) = ds.batches(batch_size).last().unwrap();
        assert_eq!(x.ncols(), 1);
        assert_eq!(y.ncols(), 2);
        assert_eq!(x[[0, 0]], 4.);
    }

    #[test]
    fn shuffle_keeps_features_with_their_labels() {
        let mut ds = counting(20);
        ds.shuffle(&mut StdRng::seed_from_u64(1));

        for (x, label) in ds.x().column(0).iter().zip(ds.labels()) {
            assert_eq!(*x as usize % 2, label);
        }
    }

    #[test]
    fn split_rounds_the_test_side_up() {
        let ds = counting(101);
        let (train, test) = ds.split(0.2, &mut StdRng::seed_from_u64(42)).unwrap();

        assert_eq!(test.len(), 21);
        assert_eq!(train.len(), 80);

        let mut seen: Vec<f32> = train.x().iter().chain(test.x().iter()).copied().collect();
        seen.sort_by(f32::total_cmp);
        assert_eq!(seen, (0..101).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_reproducible_with_a_seed() {
        let ds = counting(30);
        let (_, a) = ds.split(0.3, &mut StdRng::seed_from_u64(42)).unwrap();
        let (_, b) = ds.split(0.3, &mut StdRng::seed_from_u64(42)).unwrap();

        assert_eq!(a.x(), b.x());
    }

    #[test]
    fn degenerate_splits_fail() {
        let ds = counting(3);
        let mut rng = StdRng::seed_from_u64(0);

        assert!(ds.split(0., &mut rng).is_err());
        assert!(ds.split(1., &mut rng).is_err());
        assert!(ds.split(0.9, &mut rng).is_err());
    }

    #[test]
    fn scaling_only_touches_features() {
        let mut ds = Dataset::from_labels(vec![16., 8.], &[1, 0], 1, 2).unwrap();
        ds.scale_features(1. / 16.);

        assert_eq!(ds.x().column(0).to_vec(), [1., 0.5]);
        assert_eq!(ds.labels(), [1, 0]);
    }
}
