//! Windowed FFT Spectral Transform

use crate::error::FeatureError;
use crate::framer::Frame;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use signal_ingest::SourceUnit;

/// Shortest frame that can be transformed
pub const MIN_FRAME_LEN: usize = 2;

/// One bin of a magnitude spectrum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPoint {
    /// Bin frequency (Hz)
    pub frequency: f64,
    /// Non-negative magnitude
    pub magnitude: f64,
}

/// Non-negative frequency half of a frame's spectrum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub frame_id: u64,
    pub source_unit: SourceUnit,
    /// Ascending by frequency, starting at the 0 Hz bin
    pub points: Vec<SpectrumPoint>,
}

impl Spectrum {
    pub fn frequencies(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.frequency).collect()
    }

    pub fn magnitudes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.magnitude).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Hann window + FFT magnitude, keeping bins with frequency >= 0
pub struct SpectralTransform {
    /// FFT planner, caches plans across frames of equal length
    planner: FftPlanner<f64>,
}

impl Default for SpectralTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralTransform {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Symmetric Hann window: `0.5 - 0.5 cos(2πi / (n - 1))`
    fn apply_hann_window(signal: &mut [f64]) {
        let n = signal.len();
        let denom = (n - 1) as f64;
        for (i, value) in signal.iter_mut().enumerate() {
            let window = 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / denom).cos();
            *value *= window;
        }
    }

    /// Transform one frame.
    ///
    /// Produces `ceil(n / 2)` bins where bin `k` sits at `k / (n * dt)` Hz.
    pub fn transform(&mut self, frame: &Frame) -> Result<Spectrum, FeatureError> {
        let n = frame.len();
        if n < MIN_FRAME_LEN {
            return Err(FeatureError::InvalidFrame {
                frame_id: frame.id,
                len: n,
                min: MIN_FRAME_LEN,
            });
        }
        if !(frame.sample_interval_secs > 0.0) {
            return Err(FeatureError::InvalidConfiguration(format!(
                "sample interval must be positive, got {}s",
                frame.sample_interval_secs
            )));
        }

        let mut windowed: Vec<f64> = frame.values().collect();
        Self::apply_hann_window(&mut windowed);

        let mut buffer: Vec<Complex<f64>> = windowed
            .iter()
            .map(|&v| Complex::new(v, 0.0))
            .collect();

        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let freq_resolution = 1.0 / (n as f64 * frame.sample_interval_secs);
        let points = buffer
            .iter()
            .take(n.div_ceil(2))
            .enumerate()
            .map(|(k, c)| SpectrumPoint {
                frequency: k as f64 * freq_resolution,
                magnitude: c.norm(),
            })
            .collect();

        Ok(Spectrum {
            frame_id: frame.id,
            source_unit: frame.source_unit.clone(),
            points,
        })
    }

    /// Transform every frame; the first bad frame aborts the batch
    pub fn transform_all(&mut self, frames: &[Frame]) -> Result<Vec<Spectrum>, FeatureError> {
        frames.iter().map(|frame| self.transform(frame)).collect()
    }
}
