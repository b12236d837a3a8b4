//! Label-aware probability shift

use crate::{Error, Result};
use ndarray::ArrayD;

/// Swap predicted-max and true-label probability mass, in place.
///
/// For each example (and each sequence position, for rank-3 input) the value
/// at the argmax class is exchanged with the value at the true-label class.
/// The rest of the distribution keeps its magnitudes. Applied to teacher
/// predictions before the soft loss, this steers distillation toward the
/// teacher's label-consistent answer rather than its raw argmax.
///
/// Shapes:
/// - rank 2 `(batch, classes)` with labels of length `batch`; a label
///   outside `[0, classes)` is [`Error::LabelOutOfRange`]
/// - rank 3 `(batch, len, classes)` with labels of length `batch * len`;
///   positions labeled with a negative ignore sentinel use their own argmax
///   as the label, so the swap leaves them unchanged
/// - an empty class axis has no argmax: [`Error::ShapeMismatch`]
/// - any other rank: [`Error::UnsupportedRank`]
///
/// Mutates `tensor` through the borrow and never copies; callers relying on
/// the buffer's previous contents must clone beforehand. When the argmax
/// already equals the label the swap is a no-op.
pub fn probability_shift_(tensor: &mut ArrayD<f32>, labels: &ArrayD<i64>) -> Result<()> {
    match tensor.ndim() {
        2 => {
            let (rows, classes) = (tensor.shape()[0], tensor.shape()[1]);
            check_class_axis(tensor, classes)?;
            check_label_count(labels, rows)?;

            for (i, &label) in labels.iter().enumerate() {
                if label < 0 || label as usize >= classes {
                    return Err(Error::LabelOutOfRange {
                        label,
                        num_classes: classes,
                    });
                }
                let max_position = row_argmax_2(tensor, i, classes);
                swap_2(tensor, i, max_position, label as usize);
            }
            Ok(())
        }
        3 => {
            let (batch, len, classes) =
                (tensor.shape()[0], tensor.shape()[1], tensor.shape()[2]);
            check_class_axis(tensor, classes)?;
            check_label_count(labels, batch * len)?;

            for (r, &label) in labels.iter().enumerate() {
                let (i, j) = (r / len, r % len);
                let max_position = row_argmax_3(tensor, i, j, classes);
                let truth = if label < 0 {
                    // Ignored position: swap argmax with itself.
                    max_position
                } else if (label as usize) < classes {
                    label as usize
                } else {
                    return Err(Error::LabelOutOfRange {
                        label,
                        num_classes: classes,
                    });
                };
                let max_value = tensor[[i, j, max_position]];
                tensor[[i, j, max_position]] = tensor[[i, j, truth]];
                tensor[[i, j, truth]] = max_value;
            }
            Ok(())
        }
        rank => Err(Error::UnsupportedRank(rank)),
    }
}

// A zero-width class axis has no argmax to swap, even for ignored positions.
fn check_class_axis(tensor: &ArrayD<f32>, classes: usize) -> Result<()> {
    if classes == 0 {
        let mut expected = tensor.shape().to_vec();
        if let Some(last) = expected.last_mut() {
            *last = 1;
        }
        return Err(Error::ShapeMismatch {
            expected,
            got: tensor.shape().to_vec(),
        });
    }
    Ok(())
}

fn check_label_count(labels: &ArrayD<i64>, expected: usize) -> Result<()> {
    if labels.len() != expected {
        return Err(Error::ShapeMismatch {
            expected: vec![expected],
            got: labels.shape().to_vec(),
        });
    }
    Ok(())
}

fn row_argmax_2(tensor: &ArrayD<f32>, i: usize, classes: usize) -> usize {
    let mut best = 0;
    for k in 1..classes {
        if tensor[[i, k]] > tensor[[i, best]] {
            best = k;
        }
    }
    best
}

fn row_argmax_3(tensor: &ArrayD<f32>, i: usize, j: usize, classes: usize) -> usize {
    let mut best = 0;
    for k in 1..classes {
        if tensor[[i, j, k]] > tensor[[i, j, best]] {
            best = k;
        }
    }
    best
}

fn swap_2(tensor: &mut ArrayD<f32>, i: usize, a: usize, b: usize) {
    let value = tensor[[i, a]];
    tensor[[i, a]] = tensor[[i, b]];
    tensor[[i, b]] = value;
}
