//! Feature Engine Error Types

use thiserror::Error;

/// Errors raised while framing, transforming or extracting features
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// Rejected before any processing starts
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Frame or spectrum too short to analyse; aborts the batch
    #[error("Frame {frame_id} has {len} points, at least {min} required")]
    InvalidFrame { frame_id: u64, len: usize, min: usize },

    /// Spectrum carries no energy and the extractor is set to reject it
    #[error("Frame {frame_id} has zero total magnitude")]
    DegenerateSpectrum { frame_id: u64 },

    /// Normalization parameters of the wrong shape
    #[error("Normalization parameters must have {expected} entries, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Malformed interchange row
    #[error("Invalid row {line}: {reason}")]
    InvalidRow { line: usize, reason: String },

    /// Encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for FeatureError {
    fn from(err: std::io::Error) -> Self {
        FeatureError::Io(err.to_string())
    }
}

impl From<postcard::Error> for FeatureError {
    fn from(err: postcard::Error) -> Self {
        FeatureError::Serialization(err.to_string())
    }
}
