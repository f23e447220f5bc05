//! Overlapping Frame Segmentation

use crate::error::FeatureError;
use crate::fft::MIN_FRAME_LEN;
use serde::{Deserialize, Serialize};
use signal_ingest::{RawSample, Signal, SourceUnit};
use tracing::debug;

/// Frame length and overlap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Samples per frame
    pub frame_size: usize,
    /// Overlap between consecutive frames, `0 <= p < 100`
    pub overlap_percent: f64,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            frame_size: 30,
            overlap_percent: 50.0,
        }
    }
}

/// A fixed-length slice of one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Emission order within one framing call, from 0
    pub id: u64,
    pub source_unit: SourceUnit,
    pub samples: Vec<RawSample>,
    /// Nominal spacing between samples (seconds)
    pub sample_interval_secs: f64,
}

impl Frame {
    /// Reading values in order
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Slices signals into overlapping frames
#[derive(Debug, Clone, Copy)]
pub struct Framer {
    frame_size: usize,
    hop: usize,
}

impl Framer {
    /// Validate the configuration and derive the hop size.
    ///
    /// `hop = frame_size - floor(frame_size * overlap_percent / 100)`
    pub fn new(config: FramingConfig) -> Result<Self, FeatureError> {
        if config.frame_size < MIN_FRAME_LEN {
            return Err(FeatureError::InvalidConfiguration(format!(
                "frame size must be at least {}, got {}",
                MIN_FRAME_LEN, config.frame_size
            )));
        }
        let overlap = config.overlap_percent;
        if !overlap.is_finite() || !(0.0..100.0).contains(&overlap) {
            return Err(FeatureError::InvalidConfiguration(format!(
                "overlap must be in [0, 100), got {}",
                overlap
            )));
        }

        let overlap_samples = (config.frame_size as f64 * overlap / 100.0).floor() as usize;
        let hop = config.frame_size.saturating_sub(overlap_samples);
        if hop == 0 {
            return Err(FeatureError::InvalidConfiguration(format!(
                "overlap {}% leaves no hop for frame size {}",
                overlap, config.frame_size
            )));
        }

        Ok(Self {
            frame_size: config.frame_size,
            hop,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Stride between frame starts
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of frames a signal of `len` samples yields
    pub fn frame_count(&self, len: usize) -> usize {
        if len < self.frame_size {
            0
        } else {
            1 + (len - self.frame_size) / self.hop
        }
    }

    /// Slice a signal into frames; a trailing partial frame is dropped
    pub fn frames(&self, signal: &Signal, unit: &SourceUnit) -> Vec<Frame> {
        let samples = signal.samples();
        let interval = signal.interval_secs();

        let frames: Vec<Frame> = (0..self.frame_count(samples.len()))
            .map(|i| {
                let start = i * self.hop;
                Frame {
                    id: i as u64,
                    source_unit: unit.clone(),
                    samples: samples[start..start + self.frame_size].to_vec(),
                    sample_interval_secs: interval,
                }
            })
            .collect();

        debug!(
            "Framed {} samples of {} into {} frames (size={}, hop={})",
            samples.len(),
            unit,
            frames.len(),
            self.frame_size,
            self.hop
        );
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn framer(frame_size: usize, overlap_percent: f64) -> Result<Framer, FeatureError> {
        Framer::new(FramingConfig {
            frame_size,
            overlap_percent,
        })
    }

    #[test]
    fn test_hop_size() {
        assert_eq!(framer(30, 50.0).unwrap().hop(), 15);
        assert_eq!(framer(30, 70.0).unwrap().hop(), 9);
        assert_eq!(framer(30, 0.0).unwrap().hop(), 30);
        assert_eq!(framer(7, 50.0).unwrap().hop(), 4);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(framer(30, 100.0), Err(FeatureError::InvalidConfiguration(_))));
        assert!(matches!(framer(30, 150.0), Err(FeatureError::InvalidConfiguration(_))));
        assert!(matches!(framer(30, -1.0), Err(FeatureError::InvalidConfiguration(_))));
        assert!(matches!(framer(30, f64::NAN), Err(FeatureError::InvalidConfiguration(_))));
        assert!(matches!(framer(0, 50.0), Err(FeatureError::InvalidConfiguration(_))));
        assert!(matches!(framer(1, 0.0), Err(FeatureError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_frame_boundaries() {
        let values: Vec<f64> = (0..300).map(|i| i as f64).collect();
        let signal = Signal::from_values(&values, 10).unwrap();
        let frames = framer(30, 50.0).unwrap().frames(&signal, &SourceUnit::new("rec"));

        assert_eq!(frames.len(), 19);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.id, i as u64);
            assert_eq!(frame.len(), 30);
            assert_eq!(frame.samples[0].value, (i * 15) as f64);
            assert!((frame.sample_interval_secs - 0.01).abs() < 1e-12);
        }
        assert_eq!(frames.last().unwrap().samples[0].value, 270.0);
    }

    #[test]
    fn test_short_signal_yields_nothing() {
        let signal = Signal::from_values(&[1.0; 29], 10).unwrap();
        assert!(framer(30, 50.0).unwrap().frames(&signal, &SourceUnit::new("rec")).is_empty());
    }

    proptest! {
        #[test]
        fn frame_count_matches_formula(
            frame_size in 2usize..64,
            overlap in 0.0f64..99.99,
            len in 2usize..400,
        ) {
            let framer = framer(frame_size, overlap).unwrap();
            let hop = frame_size - (frame_size as f64 * overlap / 100.0).floor() as usize;
            prop_assert_eq!(framer.hop(), hop);

            let expected = if len >= frame_size { 1 + (len - frame_size) / hop } else { 0 };
            let signal = Signal::from_values(&vec![2000.0; len], 10).unwrap();
            let frames = framer.frames(&signal, &SourceUnit::new("p"));
            prop_assert_eq!(frames.len(), expected);
            prop_assert!(frames.iter().all(|f| f.len() == frame_size));
        }
    }
}
