//! Error types for Destilar

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("lengths of logits list ({logits}) and masks list ({masks}) mismatch")]
    MaskCountMismatch { logits: usize, masks: usize },

    #[error("rank of tensor must be 2 or 3, got {0}")]
    UnsupportedRank(usize),

    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("label {label} out of range for {num_classes} classes")]
    LabelOutOfRange { label: i64, num_classes: usize },

    #[error("adaptor output is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
