//! Adaptor output normalization
//!
//! An adaptor translates a model's raw forward output into the standard
//! schema the distillation losses consume. Models differ in what they
//! return: a single logits tensor or a list of them, one mask or one per
//! task head. [`AdaptorOutput::normalize`] coerces every single-valued field
//! into a one-element sequence so downstream code iterates uniformly.
//!
//! Required fields are accessed through fallible accessors rather than bare
//! struct fields: an adaptor that fails to provide a field the distiller
//! needs surfaces [`Error::MissingField`] at the call site instead of a
//! confusing failure deeper in the loss computation.

mod output;

#[cfg(test)]
mod tests;

pub use output::{AdaptorOutput, OneOrMany};

use crate::batch::Batch;
use crate::Result;
use ndarray::ArrayD;

/// Translation layer from raw model outputs to the distillation schema.
///
/// One adaptor per model (teacher and student each get their own). The
/// distiller calls [`Adaptor::adapt`] once per batch per model and then
/// normalizes the result.
pub trait Adaptor {
    /// Map one batch and the model's forward outputs to the standard schema.
    fn adapt(&self, batch: &Batch, model_outputs: &[ArrayD<f32>]) -> Result<AdaptorOutput>;
}
