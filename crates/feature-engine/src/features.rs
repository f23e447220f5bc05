//! Feature Vector Assembly

use crate::error::FeatureError;
use crate::fft::{Spectrum, SpectralTransform};
use crate::framer::Frame;
use crate::normalize::NormalizationParams;
use crate::statistics::StatisticalFeatures;
use serde::{Deserialize, Serialize};
use signal_ingest::{Label, SourceUnit};
use tracing::{debug, warn};

/// Number of features in the vector (8 statistical + 5 spectral)
pub const FEATURE_DIMENSION: usize = 13;

/// Raw or normalized feature values in fixed column order
pub type FeatureValues = [f64; FEATURE_DIMENSION];

/// Column names, in vector order
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = [
    "magnitude_mean",
    "magnitude_std",
    "magnitude_max",
    "magnitude_median",
    "magnitude_p25",
    "magnitude_p75",
    "total_energy",
    "magnitude_variance",
    "spectral_centroid",
    "dominant_frequency",
    "spectral_rolloff",
    "spectral_bandwidth",
    "low_frequency_energy",
];

/// Shortest spectrum the extractor accepts
pub const MIN_SPECTRUM_LEN: usize = 2;

/// Where a feature vector came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    pub source_unit: SourceUnit,
    pub frame_id: u64,
}

/// Feature vector for the downstream classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: FeatureValues,
    pub label: Label,
    pub provenance: Provenance,
}

/// What to do with a spectrum whose total magnitude is zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Centroid, bandwidth and rolloff become 0.0 and a warning is logged
    #[default]
    Sentinel,
    /// Fail with [`FeatureError::DegenerateSpectrum`]
    Reject,
}

/// Extractor settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Drop the 0 Hz bin before computing anything
    pub drop_dc_bin: bool,
    /// Energy fraction defining the rolloff frequency
    pub rolloff_fraction: f64,
    /// Upper (exclusive) bound of the low-frequency energy band (Hz)
    pub low_frequency_cutoff_hz: f64,
    pub degenerate_policy: DegeneratePolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            drop_dc_bin: false,
            rolloff_fraction: 0.85,
            low_frequency_cutoff_hz: 100.0,
            degenerate_policy: DegeneratePolicy::Sentinel,
        }
    }
}

/// Spectral shape descriptors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralShape {
    pub centroid: f64,
    pub dominant_frequency: f64,
    pub rolloff: f64,
    pub bandwidth: f64,
    pub low_frequency_energy: f64,
}

/// Lowest frequency at which the cumulative magnitude reaches `fraction` of
/// the total. `None` when the spectrum carries no energy.
pub fn spectral_rolloff(frequencies: &[f64], magnitudes: &[f64], fraction: f64) -> Option<f64> {
    let cumulative: Vec<f64> = magnitudes
        .iter()
        .scan(0.0, |acc, &m| {
            *acc += m;
            Some(*acc)
        })
        .collect();
    let total = *cumulative.last()?;
    if total <= 0.0 {
        return None;
    }
    let threshold = fraction * total;
    cumulative
        .iter()
        .position(|&c| c >= threshold)
        .map(|idx| frequencies[idx])
}

/// Index of the first maximum
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Reduces spectra to fixed-length feature vectors
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, FeatureError> {
        let fraction = config.rolloff_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(FeatureError::InvalidConfiguration(format!(
                "rolloff fraction must be in (0, 1], got {}",
                fraction
            )));
        }
        if config.low_frequency_cutoff_hz.is_nan() {
            return Err(FeatureError::InvalidConfiguration(
                "low frequency cutoff must be a number".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Compute the 13 features of one spectrum, normalizing them when
    /// parameters are supplied.
    pub fn extract(
        &self,
        spectrum: &Spectrum,
        normalization: Option<&NormalizationParams>,
    ) -> Result<FeatureValues, FeatureError> {
        let skip = usize::from(
            self.config.drop_dc_bin && spectrum.points.first().is_some_and(|p| p.frequency == 0.0),
        );
        let points = &spectrum.points[skip..];
        if points.len() < MIN_SPECTRUM_LEN {
            return Err(FeatureError::InvalidFrame {
                frame_id: spectrum.frame_id,
                len: points.len(),
                min: MIN_SPECTRUM_LEN,
            });
        }

        let frequencies: Vec<f64> = points.iter().map(|p| p.frequency).collect();
        let magnitudes: Vec<f64> = points.iter().map(|p| p.magnitude).collect();

        let stats = StatisticalFeatures::compute(&magnitudes);
        let shape = self.spectral_shape(spectrum.frame_id, &frequencies, &magnitudes, stats.sum)?;

        let values = [
            stats.mean,
            stats.std_dev,
            stats.max,
            stats.median,
            stats.p25,
            stats.p75,
            stats.sum,
            stats.variance,
            shape.centroid,
            shape.dominant_frequency,
            shape.rolloff,
            shape.bandwidth,
            shape.low_frequency_energy,
        ];

        Ok(match normalization {
            Some(params) => params.apply(&values),
            None => values,
        })
    }

    fn spectral_shape(
        &self,
        frame_id: u64,
        frequencies: &[f64],
        magnitudes: &[f64],
        total: f64,
    ) -> Result<SpectralShape, FeatureError> {
        let dominant_frequency = frequencies[argmax(magnitudes)];
        let low_frequency_energy: f64 = frequencies
            .iter()
            .zip(magnitudes)
            .filter(|(f, _)| **f < self.config.low_frequency_cutoff_hz)
            .map(|(_, m)| m)
            .sum();

        let rolloff = spectral_rolloff(frequencies, magnitudes, self.config.rolloff_fraction);
        let Some(rolloff) = rolloff.filter(|_| total > 0.0) else {
            return match self.config.degenerate_policy {
                DegeneratePolicy::Reject => Err(FeatureError::DegenerateSpectrum { frame_id }),
                DegeneratePolicy::Sentinel => {
                    warn!("Frame {} has zero spectral energy, using sentinel features", frame_id);
                    Ok(SpectralShape {
                        dominant_frequency,
                        low_frequency_energy,
                        ..Default::default()
                    })
                }
            };
        };

        let centroid = frequencies
            .iter()
            .zip(magnitudes)
            .map(|(f, m)| f * m)
            .sum::<f64>()
            / total;
        let bandwidth = (frequencies
            .iter()
            .zip(magnitudes)
            .map(|(f, m)| (f - centroid) * (f - centroid) * m)
            .sum::<f64>()
            / total)
            .sqrt();

        Ok(SpectralShape {
            centroid,
            dominant_frequency,
            rolloff,
            bandwidth,
            low_frequency_energy,
        })
    }

    /// Transform and extract every frame of one unit, tagging each vector
    /// with `label`. Any failing frame aborts the batch.
    pub fn extract_frames(
        &self,
        transform: &mut SpectralTransform,
        frames: &[Frame],
        label: Label,
        normalization: Option<&NormalizationParams>,
    ) -> Result<Vec<FeatureVector>, FeatureError> {
        let vectors = frames
            .iter()
            .map(|frame| {
                let spectrum = transform.transform(frame)?;
                Ok(FeatureVector {
                    values: self.extract(&spectrum, normalization)?,
                    label,
                    provenance: Provenance {
                        source_unit: frame.source_unit.clone(),
                        frame_id: frame.id,
                    },
                })
            })
            .collect::<Result<Vec<_>, FeatureError>>()?;

        debug!("Extracted {} feature vectors (label={})", vectors.len(), label);
        Ok(vectors)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            config: ExtractorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::SpectrumPoint;
    use crate::framer::{Framer, FramingConfig};
    use crate::normalize::DEFAULT_EPSILON;
    use proptest::prelude::*;
    use signal_ingest::Signal;

    fn spectrum(frequencies: &[f64], magnitudes: &[f64]) -> Spectrum {
        Spectrum {
            frame_id: 0,
            source_unit: SourceUnit::new("s"),
            points: frequencies
                .iter()
                .zip(magnitudes)
                .map(|(&frequency, &magnitude)| SpectrumPoint { frequency, magnitude })
                .collect(),
        }
    }

    #[test]
    fn test_known_spectrum() {
        let s = spectrum(&[0.0, 50.0, 100.0, 150.0], &[1.0, 3.0, 3.0, 1.0]);
        let v = FeatureExtractor::default().extract(&s, None).unwrap();

        assert!((v[0] - 2.0).abs() < 1e-12);
        assert!((v[1] - 1.0).abs() < 1e-12);
        assert_eq!(v[2], 3.0);
        assert!((v[3] - 2.0).abs() < 1e-12);
        assert!((v[4] - 1.0).abs() < 1e-12);
        assert!((v[5] - 3.0).abs() < 1e-12);
        assert_eq!(v[6], 8.0);
        assert!((v[7] - 1.0).abs() < 1e-12);
        // (0 + 150 + 300 + 150) / 8
        assert!((v[8] - 75.0).abs() < 1e-12);
        // Tie between 50 and 100 Hz resolves to the lower one
        assert_eq!(v[9], 50.0);
        // 85% of 8 = 6.8, cumulative [1, 4, 7, 8]
        assert_eq!(v[10], 100.0);
        // sqrt((75² + 3·25² + 3·25² + 75²) / 8)
        let bw = ((2.0 * 5625.0 + 6.0 * 625.0) / 8.0f64).sqrt();
        assert!((v[11] - bw).abs() < 1e-12);
        assert_eq!(v[12], 4.0);
    }

    #[test]
    fn test_drop_dc_bin() {
        let s = spectrum(&[0.0, 10.0, 20.0], &[100.0, 1.0, 3.0]);
        let extractor = FeatureExtractor::new(ExtractorConfig {
            drop_dc_bin: true,
            ..Default::default()
        })
        .unwrap();
        let v = extractor.extract(&s, None).unwrap();
        assert_eq!(v[6], 4.0);
        assert_eq!(v[9], 20.0);

        let too_short = spectrum(&[0.0, 10.0], &[1.0, 1.0]);
        assert!(matches!(
            extractor.extract(&too_short, None),
            Err(FeatureError::InvalidFrame { len: 1, .. })
        ));
    }

    #[test]
    fn test_silent_frame_sentinel() {
        let s = spectrum(&[0.0, 10.0, 20.0], &[0.0, 0.0, 0.0]);
        let v = FeatureExtractor::default().extract(&s, None).unwrap();
        assert!(v.iter().all(|x| x.is_finite()));
        assert_eq!(v[8], 0.0);
        assert_eq!(v[10], 0.0);
        assert_eq!(v[11], 0.0);
        assert_eq!(v[9], 0.0);
    }

    #[test]
    fn test_silent_frame_rejected() {
        let s = spectrum(&[0.0, 10.0], &[0.0, 0.0]);
        let extractor = FeatureExtractor::new(ExtractorConfig {
            degenerate_policy: DegeneratePolicy::Reject,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            extractor.extract(&s, None),
            Err(FeatureError::DegenerateSpectrum { frame_id: 0 })
        );
    }

    #[test]
    fn test_invalid_rolloff_fraction() {
        for fraction in [0.0, 1.5, f64::NAN] {
            let config = ExtractorConfig {
                rolloff_fraction: fraction,
                ..Default::default()
            };
            assert!(FeatureExtractor::new(config).is_err());
        }
    }

    #[test]
    fn test_normalized_extraction() {
        let s = spectrum(&[0.0, 50.0, 100.0, 150.0], &[1.0, 3.0, 3.0, 1.0]);
        let extractor = FeatureExtractor::default();
        let raw = extractor.extract(&s, None).unwrap();
        let params = NormalizationParams::new(raw, [1.0; FEATURE_DIMENSION], DEFAULT_EPSILON).unwrap();
        let normalized = extractor.extract(&s, Some(&params)).unwrap();
        assert!(normalized.iter().all(|x| x.abs() < 1e-12));
    }

    #[test]
    fn test_dominant_frequency_of_sine() {
        // 100 Hz sampling, 17.3 Hz tone, off-bin on purpose
        let values: Vec<f64> = (0..200)
            .map(|i| 500.0 * (2.0 * std::f64::consts::PI * 17.3 * i as f64 / 100.0).sin())
            .collect();
        let signal = Signal::from_values(&values, 10).unwrap();
        let framer = Framer::new(FramingConfig {
            frame_size: 128,
            overlap_percent: 0.0,
        })
        .unwrap();
        let frames = framer.frames(&signal, &SourceUnit::new("sine"));
        let extractor = FeatureExtractor::new(ExtractorConfig {
            drop_dc_bin: true,
            ..Default::default()
        })
        .unwrap();
        let vectors = extractor
            .extract_frames(&mut SpectralTransform::new(), &frames, Label::EVENT_A, None)
            .unwrap();

        let bin_width = 100.0 / 128.0;
        assert_eq!(vectors.len(), 1);
        assert!((vectors[0].values[9] - 17.3).abs() <= bin_width);
        assert_eq!(vectors[0].label, Label::EVENT_A);
        assert_eq!(vectors[0].provenance.frame_id, 0);
    }

    proptest! {
        #[test]
        fn rolloff_monotonic_in_fraction(
            magnitudes in proptest::collection::vec(0.0f64..100.0, 2..64),
            low in 0.50f64..0.99,
            step in 0.0f64..0.49,
        ) {
            let frequencies: Vec<f64> = (0..magnitudes.len()).map(|k| k as f64 * 2.5).collect();
            let high = (low + step).min(0.99);
            let a = spectral_rolloff(&frequencies, &magnitudes, low);
            let b = spectral_rolloff(&frequencies, &magnitudes, high);
            if let (Some(a), Some(b)) = (a, b) {
                prop_assert!(a <= b, "rolloff({})={} > rolloff({})={}", low, a, high, b);
            }
        }

        #[test]
        fn sine_dominant_frequency_within_one_bin(bin in 3usize..60, offset in -0.4f64..0.4) {
            let n = 128;
            let rate = 100.0;
            let f0 = (bin as f64 + offset) * rate / n as f64;
            let values: Vec<f64> = (0..n)
                .map(|i| (2.0 * std::f64::consts::PI * f0 * i as f64 / rate).sin())
                .collect();
            let signal = Signal::from_values(&values, 10).unwrap();
            let framer = Framer::new(FramingConfig { frame_size: n, overlap_percent: 0.0 }).unwrap();
            let frames = framer.frames(&signal, &SourceUnit::new("p"));
            let vectors = FeatureExtractor::default()
                .extract_frames(&mut SpectralTransform::new(), &frames, Label::BACKGROUND, None)
                .unwrap();
            prop_assert!((vectors[0].values[9] - f0).abs() <= rate / n as f64);
        }
    }
}
