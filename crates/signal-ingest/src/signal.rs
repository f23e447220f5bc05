//! Time-Domain Signal Model

use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::warn;

/// Tolerated deviation from the nominal interval before warning (ms)
const INTERVAL_JITTER_MS: i64 = 1;

/// One analog reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Timestamp in milliseconds
    pub timestamp_ms: i64,
    /// Analog reading
    pub value: f64,
}

impl RawSample {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self { timestamp_ms, value }
    }
}

/// An already-collected, uniformly sampled signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    samples: Vec<RawSample>,
    /// Nominal spacing derived from the first two samples
    interval_ms: i64,
}

impl Signal {
    /// Build a signal from timestamped samples.
    ///
    /// The sampling interval is taken from the first two samples. Later
    /// intervals are expected to match it; deviations are logged, not rejected.
    pub fn new(samples: Vec<RawSample>) -> Result<Self, IngestError> {
        if samples.len() < 2 {
            return Err(IngestError::TooFewSamples {
                min: 2,
                actual: samples.len(),
            });
        }

        for (index, pair) in samples.windows(2).enumerate() {
            if pair[1].timestamp_ms <= pair[0].timestamp_ms {
                return Err(IngestError::NonMonotonicTimestamp {
                    index: index + 1,
                    timestamp_ms: pair[1].timestamp_ms,
                    previous_ms: pair[0].timestamp_ms,
                });
            }
        }

        let interval_ms = samples[1].timestamp_ms - samples[0].timestamp_ms;
        let irregular = samples
            .windows(2)
            .filter(|pair| {
                ((pair[1].timestamp_ms - pair[0].timestamp_ms) - interval_ms).abs()
                    > INTERVAL_JITTER_MS
            })
            .count();
        if irregular > 0 {
            warn!(
                "{} of {} sample intervals deviate from nominal {}ms",
                irregular,
                samples.len() - 1,
                interval_ms
            );
        }

        Ok(Self {
            samples,
            interval_ms,
        })
    }

    /// Build a signal from bare values spaced `interval_ms` apart, starting at 0
    pub fn from_values(values: &[f64], interval_ms: i64) -> Result<Self, IngestError> {
        if interval_ms <= 0 {
            return Err(IngestError::InvalidInterval(interval_ms));
        }
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, &value)| RawSample::new(i as i64 * interval_ms, value))
            .collect();
        Self::new(samples)
    }

    /// All samples in order
    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }

    /// Reading values in order
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed signal; kept for API symmetry
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Nominal sample spacing in milliseconds
    pub fn interval_ms(&self) -> i64 {
        self.interval_ms
    }

    /// Nominal sample spacing in seconds
    pub fn interval_secs(&self) -> f64 {
        self.interval_ms as f64 / 1000.0
    }

    /// Sampling rate in Hz
    pub fn sample_rate_hz(&self) -> f64 {
        1000.0 / self.interval_ms as f64
    }

    /// Same timestamps with replaced values
    pub(crate) fn with_values(&self, values: &[f64]) -> Self {
        Self {
            samples: self
                .samples
                .iter()
                .zip(values)
                .map(|(s, &value)| RawSample::new(s.timestamp_ms, value))
                .collect(),
            interval_ms: self.interval_ms,
        }
    }

    /// Sub-signal over a sample index range, keeping the nominal interval.
    ///
    /// Returns `None` when the range is out of bounds or shorter than 2 samples.
    pub fn slice(&self, range: Range<usize>) -> Option<Self> {
        if range.end > self.samples.len() || range.len() < 2 {
            return None;
        }
        Some(Self {
            samples: self.samples[range].to_vec(),
            interval_ms: self.interval_ms,
        })
    }
}
