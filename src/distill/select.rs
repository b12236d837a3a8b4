//! Masked logit selection for variable-length batches

use crate::{Error, Result};
use ndarray::{Array2, ArrayD};

/// Select the valid positions of each logits tensor under padding masks.
///
/// Rank-3 entries of shape `(batch, len, classes)` are reduced to rank-2
/// `(valid_positions, classes)`, keeping only positions where the mask is
/// true. Rank-2 entries are already one row per example and pass through
/// unchanged; a mask has no effect on them.
///
/// Mask policy:
/// - `masks.len() == logits.len()`: masks are applied pairwise
/// - `masks.len() == 1`: the one mask is applied to every logits tensor
/// - anything else: [`Error::MaskCountMismatch`]
///
/// Pure function: inputs are borrowed, outputs are freshly allocated.
pub fn select_logits_with_mask(
    logits_list: &[ArrayD<f32>],
    masks_list: &[Array2<bool>],
) -> Result<Vec<ArrayD<f32>>> {
    if masks_list.len() == logits_list.len() {
        logits_list
            .iter()
            .zip(masks_list)
            .map(|(logits, mask)| select_one(logits, mask))
            .collect()
    } else if masks_list.len() == 1 {
        let mask = &masks_list[0];
        logits_list
            .iter()
            .map(|logits| select_one(logits, mask))
            .collect()
    } else {
        Err(Error::MaskCountMismatch {
            logits: logits_list.len(),
            masks: masks_list.len(),
        })
    }
}

fn select_one(logits: &ArrayD<f32>, mask: &Array2<bool>) -> Result<ArrayD<f32>> {
    if logits.ndim() != 3 {
        // One row per example already; nothing to filter.
        return Ok(logits.clone());
    }

    let (batch, len, classes) = (logits.shape()[0], logits.shape()[1], logits.shape()[2]);
    if mask.nrows() != batch || mask.ncols() != len {
        return Err(Error::ShapeMismatch {
            expected: vec![batch, len],
            got: mask.shape().to_vec(),
        });
    }

    let mut selected = Vec::new();
    let mut rows = 0;
    for i in 0..batch {
        for j in 0..len {
            if mask[[i, j]] {
                for k in 0..classes {
                    selected.push(logits[[i, j, k]]);
                }
                rows += 1;
            }
        }
    }

    let out = Array2::from_shape_vec((rows, classes), selected)
        .expect("selected buffer holds exactly rows * classes values");
    Ok(out.into_dyn())
}
