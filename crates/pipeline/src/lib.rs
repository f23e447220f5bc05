//! Acoustic Feature Pipeline
//!
//! Batch orchestration from raw recordings to normalized, leakage-safe
//! feature matrices: sanitize → frame → FFT → extract → split → normalize.

mod config;

pub use config::{PipelineConfig, RecordingFormat, RecordingSource, ENV_PREFIX};

use dataset::{Dataset, DatasetError, DatasetSplitter, Normalizer, PreparedDataset};
use feature_engine::{
    FeatureError, FeatureExtractor, FeatureValues, FeatureVector, Frame, Framer,
    NormalizationParams, SpectralTransform,
};
use signal_ingest::{
    parse_raw_log, read_signal_csv, segment_recording, IngestError, Label, Sanitizer, Signal,
    SourceUnit,
};
use std::fs::File;
use std::io::BufReader;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

/// Initialize logging; `RUST_LOG` overrides the default `info` level
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    // A subscriber may already be installed (tests, embedding hosts)
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// An already-collected recording with its event class
#[derive(Debug, Clone)]
pub struct Recording {
    pub unit: SourceUnit,
    pub signal: Signal,
    pub label: Label,
    /// Split into alternating event/background segments before framing
    pub segmented: bool,
}

/// Read a configured recording from disk
pub fn load_recording(source: &RecordingSource, sanitizer: &Sanitizer) -> Result<Recording, PipelineError> {
    let io_err = |e: std::io::Error| PipelineError::Io {
        path: source.path.display().to_string(),
        message: e.to_string(),
    };
    let reader = BufReader::new(File::open(&source.path).map_err(io_err)?);

    let signal = match source.format {
        RecordingFormat::Csv => read_signal_csv(reader)?,
        RecordingFormat::RawLog => {
            let interval_ms = source.interval_ms.ok_or_else(|| {
                PipelineError::Config(format!("raw log {} needs interval_ms", source.path.display()))
            })?;
            parse_raw_log(reader, interval_ms, sanitizer)?.signal
        }
    };

    Ok(Recording {
        unit: SourceUnit::new(source.unit_id()),
        signal,
        label: source.label,
        segmented: source.segmented,
    })
}

/// Everything a training run hands to the classifier
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Raw (unnormalized) partitions
    pub dataset: Dataset,
    /// Normalized matrices and the parameters fitted on training data
    pub prepared: PreparedDataset,
}

/// Configured batch pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    sanitizer: Sanitizer,
    framer: Framer,
    extractor: FeatureExtractor,
    splitter: DatasetSplitter,
    normalizer: Normalizer,
}

impl Pipeline {
    /// Validate every stage's configuration before any data is touched
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            sanitizer: Sanitizer::new(config.sanitizer),
            framer: Framer::new(config.framing)?,
            extractor: FeatureExtractor::new(config.features)?,
            splitter: DatasetSplitter::new(config.split)?,
            normalizer: Normalizer::new(config.normalization),
        })
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub fn framer(&self) -> &Framer {
        &self.framer
    }

    /// Raw feature vectors of one single-label signal
    pub fn featurize_signal(
        &self,
        signal: &Signal,
        unit: &SourceUnit,
        label: Label,
    ) -> Result<Vec<FeatureVector>, PipelineError> {
        let (clean, substituted) = self.sanitizer.sanitize_signal(signal);
        if substituted > 0 {
            debug!("{}: {} readings replaced by sanitizer", unit, substituted);
        }
        let frames = self.framer.frames(&clean, unit);
        let mut transform = SpectralTransform::new();
        Ok(self.extractor.extract_frames(&mut transform, &frames, label, None)?)
    }

    /// Raw feature vectors of a recording, one source unit per segment when
    /// the recording follows the event/background protocol
    pub fn featurize_recording(&self, recording: &Recording) -> Result<Vec<FeatureVector>, PipelineError> {
        let vectors = if recording.segmented {
            let mut vectors = Vec::new();
            for segment in segment_recording(&recording.signal, &recording.unit, recording.label)? {
                vectors.extend(self.featurize_signal(&segment.signal, &segment.unit, segment.label)?);
            }
            vectors
        } else {
            self.featurize_signal(&recording.signal, &recording.unit, recording.label)?
        };

        info!(
            "{}: {} samples at {:.1} Hz -> {} feature vectors",
            recording.unit,
            recording.signal.len(),
            recording.signal.sample_rate_hz(),
            vectors.len()
        );
        Ok(vectors)
    }

    /// Full training-side run.
    ///
    /// Every recording is featurized before splitting; normalization is
    /// fitted on the training partition only and then applied to all three.
    pub fn run(&self, recordings: &[Recording]) -> Result<PipelineOutput, PipelineError> {
        let mut vectors = Vec::new();
        for recording in recordings {
            vectors.extend(self.featurize_recording(recording)?);
        }
        info!("Featurized {} recordings into {} vectors", recordings.len(), vectors.len());

        let dataset = self.splitter.split(vectors)?;
        dataset.ensure_trainable()?;
        let prepared = self.normalizer.prepare(&dataset)?;

        Ok(PipelineOutput { dataset, prepared })
    }

    /// Features of one already-collected burst treated as a single frame,
    /// as done at inference time.
    pub fn featurize_window(
        &self,
        values: &[f64],
        interval_ms: i64,
        normalization: Option<&NormalizationParams>,
    ) -> Result<FeatureValues, PipelineError> {
        let signal = Signal::from_values(values, interval_ms)?;
        let (clean, _) = self.sanitizer.sanitize_signal(&signal);
        let frame = Frame {
            id: 0,
            source_unit: SourceUnit::new("window"),
            samples: clean.samples().to_vec(),
            sample_interval_secs: clean.interval_secs(),
        };
        let spectrum = SpectralTransform::new().transform(&frame)?;
        Ok(self.extractor.extract(&spectrum, normalization)?)
    }
}
