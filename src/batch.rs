//! Batch representation consumed by adaptors
//!
//! A batch is a mapping of named fields to tensors, produced by an external
//! data-loading collaborator and handed to [`Adaptor::adapt`] together with
//! the raw model outputs for one training step.
//!
//! [`Adaptor::adapt`]: crate::adaptor::Adaptor::adapt

use ndarray::ArrayD;
use std::collections::BTreeMap;

/// A single named field of a training batch.
#[derive(Debug, Clone)]
pub enum BatchValue {
    /// Floating-point tensor (embeddings, precomputed logits, ...)
    Float(ArrayD<f32>),
    /// Integer tensor (token ids, labels)
    Int(ArrayD<i64>),
    /// Boolean tensor (attention / padding masks)
    Bool(ArrayD<bool>),
}

impl BatchValue {
    /// View as a float tensor, if that is what this field holds.
    pub fn as_float(&self) -> Option<&ArrayD<f32>> {
        match self {
            BatchValue::Float(t) => Some(t),
            _ => None,
        }
    }

    /// View as an integer tensor, if that is what this field holds.
    pub fn as_int(&self) -> Option<&ArrayD<i64>> {
        match self {
            BatchValue::Int(t) => Some(t),
            _ => None,
        }
    }

    /// View as a boolean tensor, if that is what this field holds.
    pub fn as_bool(&self) -> Option<&ArrayD<bool>> {
        match self {
            BatchValue::Bool(t) => Some(t),
            _ => None,
        }
    }
}

/// One training batch: named fields in insertion-independent order.
pub type Batch = BTreeMap<String, BatchValue>;
