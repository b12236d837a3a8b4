//! Knowledge distillation primitives
//!
//! The tensor-level building blocks a distillation trainer composes per
//! batch:
//!
//! - **Masked logit selection**: drops padded positions from rank-3 logits
//!   before the soft loss sees them
//! - **Probability shift**: swaps predicted-max and true-label probability
//!   mass in place, biasing the soft loss toward label-consistent teachers
//! - **Distillation loss**: temperature-scaled soft/hard loss over selected
//!   logits
//! - **Custom matches**: descriptors pairing teacher and student layers for
//!   intermediate losses
//!
//! ## Example
//!
//! ```
//! use destilar::distill::{probability_shift_, DistillationLoss};
//! use ndarray::array;
//!
//! let mut teacher = array![[0.1f32, 0.7, 0.2]].into_dyn();
//! let labels = array![0i64].into_dyn();
//! probability_shift_(&mut teacher, &labels).unwrap();
//! assert_eq!(teacher, array![[0.7f32, 0.1, 0.2]].into_dyn());
//! ```

mod loss;
mod matching;
mod select;
mod shift;


pub use loss::{DistillationLoss, KdLossKind};
pub use matching::{CustomMatch, IntermediateLoss, Projection};
pub use select::select_logits_with_mask;
pub use shift::probability_shift_;
