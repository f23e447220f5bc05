//! Ingestion Error Types

use thiserror::Error;

/// Errors while turning raw input into a signal
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    /// Not enough samples to derive a sampling interval
    #[error("Signal needs at least {min} samples, got {actual}")]
    TooFewSamples { min: usize, actual: usize },

    /// Timestamps must strictly increase
    #[error("Timestamp {timestamp_ms}ms at index {index} does not increase over {previous_ms}ms")]
    NonMonotonicTimestamp {
        index: usize,
        timestamp_ms: i64,
        previous_ms: i64,
    },

    /// Sample interval must be positive
    #[error("Sample interval must be positive, got {0}ms")]
    InvalidInterval(i64),

    /// Malformed tabular row
    #[error("Invalid row {line}: {reason}")]
    InvalidRow { line: usize, reason: String },

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Io(err.to_string())
    }
}
