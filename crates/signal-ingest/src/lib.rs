//! Signal Ingestion
//!
//! Raw analog signal model, range sanitization, device log parsing and
//! recording segmentation for the acoustic feature pipeline.

mod error;
mod labeling;
mod raw_log;
mod sanitizer;
mod signal;
mod tabular;

pub use error::IngestError;
pub use labeling::{segment_recording, LabeledSegment, SEGMENT_COUNT};
pub use raw_log::{parse_raw_log, RawLogParse, ANALOG_VALUE_TOKEN};
pub use sanitizer::{Sanitized, Sanitizer, ValidRange};
pub use signal::{RawSample, Signal};
pub use tabular::{read_signal_csv, write_signal_csv, SIGNAL_CSV_HEADER};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one independent recording unit (a file or a labelled segment of one)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceUnit(String);

impl SourceUnit {
    /// Create a new source unit identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier of the n-th segment carved out of this unit
    pub fn segment(&self, index: usize) -> Self {
        Self(format!("{}#{}", self.0, index))
    }

    /// Borrow the identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceUnit {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Class code handed to the downstream classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u16);

impl Label {
    /// No event present
    pub const BACKGROUND: Label = Label(0);
    /// First event type (shouting in the reference deployment)
    pub const EVENT_A: Label = Label(1);
    /// Second event type (drilling in the reference deployment)
    pub const EVENT_B: Label = Label(2);

    /// Human readable class name for the built-in codes
    pub fn name(&self) -> &'static str {
        match *self {
            Self::BACKGROUND => "background",
            Self::EVENT_A => "event-a",
            Self::EVENT_B => "event-b",
            _ => "custom",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}
