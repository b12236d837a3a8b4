//! The standardized adaptor output schema

use crate::{Error, Result};
use ndarray::{Array2, ArrayD};

/// A field supplied either as a single value or as a sequence of values.
///
/// Adaptors for single-task models return bare tensors; multi-task adaptors
/// return lists. [`OneOrMany::normalize`] rewraps the single form so both
/// look the same downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    /// A bare single value.
    One(T),
    /// An explicit sequence of values.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Rewrap `One(x)` as `Many(vec![x])` in place. `Many` is left untouched.
    pub fn normalize(&mut self) {
        if matches!(self, OneOrMany::One(_)) {
            let one = std::mem::replace(self, OneOrMany::Many(Vec::new()));
            if let OneOrMany::One(value) = one {
                *self = OneOrMany::Many(vec![value]);
            }
        }
    }

    /// View the contents uniformly as a slice, whichever form this is.
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }

    /// Number of values held.
    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(values) => values.len(),
        }
    }

    /// True only for an empty `Many`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        OneOrMany::One(value)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

/// One model's output for one batch, in the standard distillation schema.
///
/// All fields are optional; which ones must be present depends on the losses
/// the distiller is configured with. The fallible accessors express that
/// contract explicitly.
#[derive(Debug, Clone, Default)]
pub struct AdaptorOutput {
    /// Logits per task head, shape `(batch, classes)` or `(batch, len, classes)`.
    pub logits: Option<OneOrMany<ArrayD<f32>>>,
    /// Padding masks aligned to the leading dims of rank-3 logits.
    pub logits_mask: Option<OneOrMany<Array2<bool>>>,
    /// Losses already computed inside the model (e.g. a hard-label loss).
    pub losses: Option<OneOrMany<f32>>,
    /// Ground-truth labels, shape `(batch,)` or `(batch, len)`.
    pub labels: Option<OneOrMany<ArrayD<i64>>>,
    /// Intermediate hidden states, one tensor per matched layer.
    pub hidden: Option<Vec<ArrayD<f32>>>,
    /// Attention matrices, one tensor per matched layer.
    pub attention: Option<Vec<ArrayD<f32>>>,
}

impl AdaptorOutput {
    /// Coerce every present single-valued field into a one-element sequence.
    ///
    /// Sequence-valued entries are left untouched. Returns the same output
    /// for call chaining; this mutates in place rather than copying.
    pub fn normalize(&mut self) -> &mut Self {
        if let Some(logits) = self.logits.as_mut() {
            logits.normalize();
        }
        if let Some(masks) = self.logits_mask.as_mut() {
            masks.normalize();
        }
        if let Some(losses) = self.losses.as_mut() {
            losses.normalize();
        }
        if let Some(labels) = self.labels.as_mut() {
            labels.normalize();
        }
        self
    }

    /// Logits, required. Fails with [`Error::MissingField`] when absent.
    pub fn logits(&self) -> Result<&[ArrayD<f32>]> {
        self.logits
            .as_ref()
            .map(OneOrMany::as_slice)
            .ok_or(Error::MissingField("logits"))
    }

    /// Logit masks, required for variable-length batches.
    pub fn logits_mask(&self) -> Result<&[Array2<bool>]> {
        self.logits_mask
            .as_ref()
            .map(OneOrMany::as_slice)
            .ok_or(Error::MissingField("logits_mask"))
    }

    /// Model-internal losses, required when hard-loss weighting is enabled.
    pub fn losses(&self) -> Result<&[f32]> {
        self.losses
            .as_ref()
            .map(OneOrMany::as_slice)
            .ok_or(Error::MissingField("losses"))
    }

    /// Ground-truth labels, required by the probability-shift transform.
    pub fn labels(&self) -> Result<&[ArrayD<i64>]> {
        self.labels
            .as_ref()
            .map(OneOrMany::as_slice)
            .ok_or(Error::MissingField("labels"))
    }

    /// Intermediate hidden states, required by hidden-layer matches.
    pub fn hidden(&self) -> Result<&[ArrayD<f32>]> {
        self.hidden
            .as_deref()
            .ok_or(Error::MissingField("hidden"))
    }

    /// Attention matrices, required by attention matches.
    pub fn attention(&self) -> Result<&[ArrayD<f32>]> {
        self.attention
            .as_deref()
            .ok_or(Error::MissingField("attention"))
    }
}
