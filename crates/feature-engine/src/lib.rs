//! Feature Engineering Engine
//!
//! Turns sanitized signals into fixed-length spectral feature vectors:
//! overlapping framing, Hann-windowed FFT and statistical/spectral reduction.

mod error;
mod features;
mod fft;
mod framer;
mod interchange;
mod normalize;
mod statistics;

pub use error::FeatureError;
pub use features::{
    spectral_rolloff, DegeneratePolicy, ExtractorConfig, FeatureExtractor, FeatureValues,
    FeatureVector, Provenance, SpectralShape, FEATURE_DIMENSION, FEATURE_NAMES, MIN_SPECTRUM_LEN,
};
pub use fft::{Spectrum, SpectrumPoint, SpectralTransform, MIN_FRAME_LEN};
pub use framer::{Frame, Framer, FramingConfig};
pub use interchange::{read_spectrum_csv, write_spectrum_csv, SPECTRUM_CSV_HEADER};
pub use normalize::{NormalizationParams, DEFAULT_EPSILON};
pub use statistics::{percentile, StatisticalFeatures};
