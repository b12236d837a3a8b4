//! # Destilar: Knowledge Distillation Utilities
//!
//! Destilar provides the data-shaping layer a knowledge-distillation trainer
//! is built on: adaptor-output normalization, masked logit selection for
//! variable-length batches, the label-aware probability-shift transform, and
//! a scoped training-mode guard for teacher/student models.
//!
//! ## Architecture
//!
//! - **adaptor**: Normalizes single-or-sequence model outputs into a uniform schema
//! - **distill**: Masked logit selection, probability shift, distillation loss, match descriptors
//! - **scope**: Train/eval mode scoping for teacher and student models
//! - **monitor**: Scalar metric sinks (no-op, in-memory, JSONL)
//! - **config**: Training and distillation settings
//!
//! ## Example
//!
//! ```
//! use destilar::distill::select_logits_with_mask;
//! use ndarray::{array, Array2};
//!
//! let logits = vec![array![[[1.0f32, 2.0], [3.0, 4.0]]].into_dyn()];
//! let masks: Vec<Array2<bool>> = vec![array![[true, false]]];
//!
//! let selected = select_logits_with_mask(&logits, &masks).unwrap();
//! assert_eq!(selected[0].shape(), &[1, 2]);
//! ```

pub mod adaptor;
pub mod batch;
pub mod config;
pub mod distill;
pub mod logging;
pub mod monitor;
pub mod scope;

pub mod error;

// Re-export commonly used types
pub use adaptor::{Adaptor, AdaptorOutput, OneOrMany};
pub use batch::{Batch, BatchValue};
pub use error::{Error, Result};
pub use scope::{with_distillation_modes, TeacherGroup, TrainMode};
