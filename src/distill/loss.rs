//! Temperature-scaled distillation loss

use crate::config::DistillationConfig;
use crate::{Error, Result};
use ndarray::{Array1, ArrayD, ArrayView1, ArrayView2, Ix2};
use serde::{Deserialize, Serialize};

/// Which soft loss to apply between teacher and student logits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KdLossKind {
    /// Temperature-scaled cross-entropy (KL divergence to the teacher)
    #[default]
    Ce,
    /// Mean squared error between temperature-scaled logits
    Mse,
}

/// Knowledge distillation loss over selected rank-2 logits.
///
/// Combines soft targets from the teacher with hard targets from
/// ground-truth labels (cross-entropy). With the default [`KdLossKind::Ce`]:
///
/// ```text
/// L = α * T² * KL(softmax(teacher/T) || softmax(student/T))
///   + (1-α) * CE(student, labels)
/// ```
///
/// [`KdLossKind::Mse`] replaces the KL term with the mean squared error
/// between the temperature-scaled logits.
///
/// Rows whose label is the negative ignore sentinel contribute to the soft
/// term only; the hard term averages over the remaining rows.
///
/// # Example
///
/// ```
/// use destilar::distill::DistillationLoss;
/// use ndarray::array;
///
/// let loss_fn = DistillationLoss::new(2.0, 0.7);
/// let student = array![[2.0f32, 1.0, 0.5]].into_dyn();
/// let teacher = array![[1.5f32, 1.2, 0.8]].into_dyn();
/// let labels = array![0i64].into_dyn();
///
/// let loss = loss_fn.forward(&student, &teacher, &labels).unwrap();
/// assert!(loss > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct DistillationLoss {
    /// Temperature for softening probability distributions
    pub temperature: f32,
    /// Weight for the soft loss (α). Hard loss weight is (1-α)
    pub alpha: f32,
    /// Soft loss applied between teacher and student logits
    pub kind: KdLossKind,
}

impl Default for DistillationLoss {
    fn default() -> Self {
        Self::new(4.0, 0.7)
    }
}

impl DistillationLoss {
    /// Create a new distillation loss with the [`KdLossKind::Ce`] soft term.
    ///
    /// # Panics
    ///
    /// Panics if `temperature <= 0` or `alpha` is outside `[0, 1]`.
    pub fn new(temperature: f32, alpha: f32) -> Self {
        assert!(
            temperature > 0.0,
            "Temperature must be positive, got {}",
            temperature
        );
        assert!(
            (0.0..=1.0).contains(&alpha),
            "Alpha must be in [0, 1], got {}",
            alpha
        );

        Self {
            temperature,
            alpha,
            kind: KdLossKind::Ce,
        }
    }

    /// Select a different soft loss kind.
    pub fn with_kind(mut self, kind: KdLossKind) -> Self {
        self.kind = kind;
        self
    }

    /// Build the loss a [`DistillationConfig`] describes.
    pub fn from_config(config: &DistillationConfig) -> Self {
        Self::new(config.temperature, config.alpha).with_kind(config.kd_loss_kind)
    }

    /// Compute the combined soft/hard loss.
    ///
    /// Both logits tensors must be rank 2 with identical shape (run rank-3
    /// sequence logits through
    /// [`select_logits_with_mask`](super::select_logits_with_mask) first);
    /// `labels` must hold one entry per row.
    pub fn forward(
        &self,
        student_logits: &ArrayD<f32>,
        teacher_logits: &ArrayD<f32>,
        labels: &ArrayD<i64>,
    ) -> Result<f32> {
        let student = as_rank2(student_logits)?;
        let teacher = as_rank2(teacher_logits)?;
        if student.shape() != teacher.shape() {
            return Err(Error::ShapeMismatch {
                expected: student.shape().to_vec(),
                got: teacher.shape().to_vec(),
            });
        }
        if labels.len() != student.nrows() {
            return Err(Error::ShapeMismatch {
                expected: vec![student.nrows()],
                got: labels.shape().to_vec(),
            });
        }

        let soft = self.soft_loss(&student, &teacher);
        let hard = self.hard_loss(&student, labels)?;

        Ok(self.alpha * soft + (1.0 - self.alpha) * hard)
    }

    /// Soft loss between teacher and student logits, per [`KdLossKind`].
    ///
    /// `Ce` is the mean KL(teacher || student) over rows, scaled by T².
    /// `Mse` is the mean squared difference of the temperature-scaled
    /// logits over all entries.
    fn soft_loss(&self, student: &ArrayView2<f32>, teacher: &ArrayView2<f32>) -> f32 {
        let rows = student.nrows();
        if rows == 0 || student.is_empty() {
            return 0.0;
        }

        match self.kind {
            KdLossKind::Ce => {
                let mut total = 0.0;
                for (s_row, t_row) in student.outer_iter().zip(teacher.outer_iter()) {
                    let p = softmax(t_row, self.temperature);
                    let log_q = log_softmax(s_row, self.temperature);
                    total += kl_divergence(&p, &log_q);
                }
                self.temperature * self.temperature * total / rows as f32
            }
            KdLossKind::Mse => {
                let total: f32 = student
                    .iter()
                    .zip(teacher.iter())
                    .map(|(&s, &t)| {
                        let diff = (s - t) / self.temperature;
                        diff * diff
                    })
                    .sum();
                total / student.len() as f32
            }
        }
    }

    /// Mean cross-entropy over rows with a non-sentinel label.
    fn hard_loss(&self, student: &ArrayView2<f32>, labels: &ArrayD<i64>) -> Result<f32> {
        let classes = student.ncols();
        let mut total = 0.0;
        let mut counted = 0;
        for (row, &label) in student.outer_iter().zip(labels.iter()) {
            if label < 0 {
                continue;
            }
            if label as usize >= classes {
                return Err(Error::LabelOutOfRange {
                    label,
                    num_classes: classes,
                });
            }
            let log_probs = log_softmax(row, 1.0);
            total -= log_probs[label as usize];
            counted += 1;
        }
        if counted == 0 {
            Ok(0.0)
        } else {
            Ok(total / counted as f32)
        }
    }
}

fn as_rank2(tensor: &ArrayD<f32>) -> Result<ArrayView2<'_, f32>> {
    tensor
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| Error::UnsupportedRank(tensor.ndim()))
}

/// Numerically stable temperature-scaled softmax.
fn softmax(row: ArrayView1<f32>, temperature: f32) -> Array1<f32> {
    let scaled = row.mapv(|x| x / temperature);
    let max = scaled.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp = scaled.mapv(|x| (x - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Numerically stable temperature-scaled log-softmax.
fn log_softmax(row: ArrayView1<f32>, temperature: f32) -> Array1<f32> {
    let scaled = row.mapv(|x| x / temperature);
    let max = scaled.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let shifted = scaled.mapv(|x| x - max);
    let log_sum_exp = shifted.mapv(f32::exp).sum().ln();
    shifted.mapv(|x| x - log_sum_exp)
}

/// KL(P || Q) given P and log(Q).
fn kl_divergence(p: &Array1<f32>, log_q: &Array1<f32>) -> f32 {
    let p_log_p: f32 = p
        .iter()
        .map(|&pi| if pi > 1e-10 { pi * pi.ln() } else { 0.0 })
        .sum();
    let p_log_q: f32 = p.iter().zip(log_q.iter()).map(|(&pi, &lqi)| pi * lqi).sum();
    p_log_p - p_log_q
}
