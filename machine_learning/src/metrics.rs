use ndarray::ArrayView2;

use crate::{MlErr, Result};

/// The index of the largest value of each row, the first one wins on ties.
pub fn argmax_rows(m: ArrayView2<f32>) -> Vec<usize> {
    m.rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            let mut best_value = f32::NEG_INFINITY;

            for (i, &v) in row.iter().enumerate() {
                if v > best_value {
                    best = i;
                    best_value = v;
                }
            }

            best
        })
        .collect()
}

/// Computes the fraction of predictions that match the truth.
///
/// # Arguments
/// * `pred` - The predicted classes.
/// * `truth` - The expected classes.
///
/// # Returns
/// The accuracy in `[0, 1]`, 0 when there are no samples.
pub fn accuracy(pred: &[usize], truth: &[usize]) -> Result<f32> {
    check_lengths(pred, truth)?;

    if pred.is_empty() {
        return Ok(0.);
    }

    let hits = pred.iter().zip(truth).filter(|(p, t)| p == t).count();
    Ok(hits as f32 / pred.len() as f32)
}

/// Counts `(truth, pred)` pairs, rows are the expected class and columns the predicted one.
///
/// # Arguments
/// * `pred` - The predicted classes.
/// * `truth` - The expected classes.
/// * `n_classes` - The amount of classes, every class must be lower.
pub fn confusion_matrix(
    pred: &[usize],
    truth: &[usize],
    n_classes: usize,
) -> Result<Vec<Vec<usize>>> {
    check_lengths(pred, truth)?;

    let mut matrix = vec![vec![0; n_classes]; n_classes];
    for (&p, &t) in pred.iter().zip(truth) {
        if p >= n_classes || t >= n_classes {
            return Err(MlErr::InvalidDataset(format!(
                "class {} is out of range for {n_classes} classes",
                p.max(t)
            )));
        }

        matrix[t][p] += 1;
    }

    Ok(matrix)
}

fn check_lengths(pred: &[usize], truth: &[usize]) -> Result<()> {
    if pred.len() != truth.len() {
        return Err(MlErr::SizeMismatch {
            what: "predictions",
            got: pred.len(),
            expected: truth.len(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn argmax_picks_the_first_maximum() {
        let m = array![[0.1, 0.7, 0.2], [0.5, 0.5, 0.], [-3., -2., -1.]];
        assert_eq!(argmax_rows(m.view()), [1, 0, 2]);
    }

    #[test]
    fn accuracy_counts_hits() {
        assert_eq!(accuracy(&[1, 2, 3, 4], &[1, 2, 0, 4]).unwrap(), 0.75);
        assert_eq!(accuracy(&[], &[]).unwrap(), 0.);
        assert!(accuracy(&[1], &[1, 2]).is_err());
    }

    #[test]
    fn confusion_matrix_rows_are_the_truth() {
        let m = confusion_matrix(&[0, 1, 1, 2], &[0, 0, 1, 2], 3).unwrap();

        assert_eq!(m, vec![vec![1, 1, 0], vec![0, 1, 0], vec![0, 0, 1]]);
        assert!(confusion_matrix(&[3], &[0], 3).is_err());
    }
}
