//! Recording Segmentation and Labeling
//!
//! Training recordings follow a fixed protocol: the recording is split into
//! six equal parts and the event is produced during parts 1, 3 and 5 with
//! background in between. The last event part runs to the end of the
//! recording, absorbing the sixth part and any remainder.

use crate::error::IngestError;
use crate::signal::Signal;
use crate::{Label, SourceUnit};

/// Number of equal parts a recording is divided into
pub const SEGMENT_COUNT: usize = 6;

/// A contiguous, single-label slice of a recording
#[derive(Debug, Clone)]
pub struct LabeledSegment {
    /// Independent unit id, `<recording>#<n>` with n starting at 1
    pub unit: SourceUnit,
    pub label: Label,
    pub signal: Signal,
}

/// Split a recording into its five labelled segments.
///
/// The protocol is an upstream precondition and is not verified against the
/// signal content.
pub fn segment_recording(
    signal: &Signal,
    unit: &SourceUnit,
    event: Label,
) -> Result<Vec<LabeledSegment>, IngestError> {
    let part = signal.len() / SEGMENT_COUNT;
    if part < 2 {
        return Err(IngestError::TooFewSamples {
            min: 2 * SEGMENT_COUNT,
            actual: signal.len(),
        });
    }

    let bounds = [
        (0, part, event),
        (part, 2 * part, Label::BACKGROUND),
        (2 * part, 3 * part, event),
        (3 * part, 4 * part, Label::BACKGROUND),
        (4 * part, signal.len(), event),
    ];

    bounds
        .iter()
        .enumerate()
        .map(|(i, &(start, end, label))| {
            let segment = signal
                .slice(start..end)
                .ok_or_else(|| IngestError::InvalidFormat(format!("segment {}..{} out of bounds", start, end)))?;
            Ok(LabeledSegment {
                unit: unit.segment(i + 1),
                label,
                signal: segment,
            })
        })
        .collect()
}
