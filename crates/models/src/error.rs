use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model has not been fitted")]
    NotFitted,

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("feature dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("label count {labels} does not match sample count {samples}")]
    LabelMismatch { samples: usize, labels: usize },

    #[error("invalid parameters for {model}: {reason}")]
    InvalidParams { model: String, reason: String },

    #[error("model artifact not found at {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
