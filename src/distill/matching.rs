//! Intermediate-layer match descriptors

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Loss applied between a matched pair of intermediate layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntermediateLoss {
    /// Mean squared error between hidden states
    HiddenMse,
    /// Mean squared error between attention matrices
    AttentionMse,
    /// Cosine similarity between hidden states
    Cosine,
    /// Normalized MSE (patient knowledge distillation)
    Nst,
}

/// Optional projection bridging a teacher/student width mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// Trainable linear map from student width to teacher width
    Linear,
    /// Linear map followed by ReLU
    Relu,
    /// Linear map followed by GELU
    Gelu,
}

/// Configuration record for one intermediate-layer distillation loss.
///
/// Pairs a teacher module path with a student module path, the loss to apply
/// between their outputs, a scalar weight, and an optional projection (with
/// its optimizer parameter group) for width mismatches. Pure data; the
/// distiller interprets it.
///
/// # Example
///
/// ```
/// use destilar::distill::{CustomMatch, IntermediateLoss};
///
/// let m = CustomMatch::new(
///     "encoder.layer.8",
///     "encoder.layer.2",
///     IntermediateLoss::HiddenMse,
///     1.0,
/// );
/// let round_tripped = CustomMatch::from_map(&m.to_map().unwrap()).unwrap();
/// assert_eq!(m, round_tripped);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomMatch {
    /// Dotted path of the matched teacher module
    pub teacher_module: String,
    /// Dotted path of the matched student module
    pub student_module: String,
    /// Loss applied between the matched outputs
    pub loss: IntermediateLoss,
    /// Scalar weight of this match in the total loss
    pub weight: f32,
    /// Projection bridging a width mismatch, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Projection>,
    /// Optimizer settings for the projection's parameters (e.g. its own lr)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub projection_group: BTreeMap<String, Value>,
}

impl CustomMatch {
    /// Create a match with no projection.
    pub fn new(
        teacher_module: impl Into<String>,
        student_module: impl Into<String>,
        loss: IntermediateLoss,
        weight: f32,
    ) -> Self {
        Self {
            teacher_module: teacher_module.into(),
            student_module: student_module.into(),
            loss,
            weight,
            projection: None,
            projection_group: BTreeMap::new(),
        }
    }

    /// Attach a projection and its optimizer parameter group.
    pub fn with_projection(
        mut self,
        projection: Projection,
        projection_group: BTreeMap<String, Value>,
    ) -> Self {
        self.projection = Some(projection);
        self.projection_group = projection_group;
        self
    }

    /// Serialize to a plain JSON mapping.
    pub fn to_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => unreachable!("a struct serializes to a JSON object"),
        }
    }

    /// Reconstruct from a plain JSON mapping.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(map.clone()))?)
    }
}
