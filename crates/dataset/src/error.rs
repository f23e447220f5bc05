//! Dataset Error Types

use crate::partition::PartitionKind;
use feature_engine::FeatureError;
use thiserror::Error;

/// Errors while partitioning, normalizing or handing data to a classifier
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetError {
    /// A partition cannot support training or evaluation
    #[error("Insufficient data in {partition} partition: {reason}")]
    InsufficientData {
        partition: PartitionKind,
        reason: String,
    },

    /// Split proportions outside their valid range
    #[error("Invalid split ratio: {0}")]
    InvalidRatio(String),

    /// Normalization statistics may only come from the training partition
    #[error("Refusing to fit normalization on the {0} partition")]
    FitOnEvaluationPartition(PartitionKind),

    /// Classifier used before fitting
    #[error("Classifier has not been fitted")]
    NotFitted,

    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// Encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        DatasetError::Serialization(err.to_string())
    }
}
