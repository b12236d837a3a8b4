//! Training and distillation settings
//!
//! Thin serde structs consumed by this layer; parsing from files and CLI
//! belongs to the embedding trainer. `validate` is called once after
//! deserialization and surfaces out-of-range values as
//! [`Error::ConfigError`](crate::Error::ConfigError).


use crate::distill::KdLossKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings of the training run itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Directory for scalar metric logs; `None` disables metric logging
    pub log_dir: Option<PathBuf>,
    /// Report scalar metrics every this many steps
    pub print_freq: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            print_freq: 20,
        }
    }
}

impl TrainingConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.print_freq == 0 {
            return Err(Error::ConfigError(
                "print_freq must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings of the distillation losses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistillationConfig {
    /// Softening temperature for the soft loss
    pub temperature: f32,
    /// Weight of the soft loss; the hard loss gets `1 - alpha`
    pub alpha: f32,
    /// Soft loss applied between teacher and student logits
    pub kd_loss_kind: KdLossKind,
    /// Apply the probability-shift transform to teacher logits before the
    /// soft loss
    pub probability_shift: bool,
}

impl Default for DistillationConfig {
    fn default() -> Self {
        Self {
            temperature: 4.0,
            alpha: 0.7,
            kd_loss_kind: KdLossKind::Ce,
            probability_shift: false,
        }
    }
}

impl DistillationConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return Err(Error::ConfigError(format!(
                "temperature must be positive and finite, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(Error::ConfigError(format!(
                "alpha must be in [0, 1], got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}
