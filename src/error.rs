//! Error types for the detection adapter.

use thiserror::Error;

use crate::protocol::ClassId;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Errors raised while building, configuring or running a `DetectorAdapter`.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The requested operation cannot be performed for this adapter.
    #[error("{operation} is not supported: {reason}")]
    Unsupported {
        operation: &'static str,
        reason: String,
    },

    #[error("image batch size must be positive, got {0}")]
    InvalidBatchSize(usize),

    #[error("duplicate class id {0} in class table")]
    DuplicateClassId(ClassId),

    #[error("duplicate class name {0:?} in class table")]
    DuplicateClassName(String),

    /// Image `index` has a rank or channel count the adapter cannot dispatch.
    #[error("image {index} has unsupported shape {shape:?}")]
    InvalidImageShape { index: usize, shape: Vec<usize> },

    #[error("boxes must have shape (N, 4), got {shape:?}")]
    BoxShapeMismatch { shape: Vec<usize> },

    #[error("score shape mismatch: expected {expected}, got {actual:?}")]
    ScoreShapeMismatch { expected: String, actual: Vec<usize> },

    #[error("label count mismatch: {boxes} boxes but {labels} labels")]
    LabelCountMismatch { boxes: usize, labels: usize },

    /// The detector returned a different number of targets than images sent.
    #[error("detector returned {actual} targets for {expected} images")]
    TargetCountMismatch { expected: usize, actual: usize },

    #[error("class id {0} is not in the class table")]
    UnknownClassId(ClassId),

    #[error("class id {id} has no score column (scores have {columns} columns)")]
    ClassIdOutOfRange { id: ClassId, columns: usize },

    #[error("detector failed: {0}")]
    Detector(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("configuration serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdapterError {
    pub fn unsupported<S: Into<String>>(operation: &'static str, reason: S) -> Self {
        Self::Unsupported {
            operation,
            reason: reason.into(),
        }
    }

    pub fn detector<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Detector(Box::new(err))
    }
}
