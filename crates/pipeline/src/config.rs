//! Pipeline configuration

use crate::PipelineError;
use dataset::{NormalizerConfig, SplitConfig};
use feature_engine::{ExtractorConfig, FramingConfig};
use serde::{Deserialize, Serialize};
use signal_ingest::{Label, ValidRange};
use std::path::{Path, PathBuf};

/// Prefix of environment overrides, e.g. `NOISE_PIPELINE__FRAMING__FRAME_SIZE=64`
pub const ENV_PREFIX: &str = "NOISE_PIPELINE";

/// How a recording file is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingFormat {
    /// `timestamp,analog_value` rows
    Csv,
    /// Device log with one `"analog_value":` reading per line
    RawLog,
}

/// One recording to ingest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSource {
    pub path: PathBuf,
    pub format: RecordingFormat,
    /// Event class recorded; background segments are labelled automatically
    pub label: Label,
    /// Sample spacing for raw logs, which carry no timestamps
    #[serde(default)]
    pub interval_ms: Option<i64>,
    /// Apply the six-part event/background protocol
    #[serde(default = "default_segmented")]
    pub segmented: bool,
    /// Unit id, defaults to the file stem
    #[serde(default)]
    pub unit: Option<String>,
}

fn default_segmented() -> bool {
    true
}

impl RecordingSource {
    /// Unit id of this recording
    pub fn unit_id(&self) -> String {
        self.unit.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        })
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sanitizer: ValidRange,
    pub framing: FramingConfig,
    pub features: ExtractorConfig,
    pub split: SplitConfig,
    pub normalization: NormalizerConfig,
    pub recordings: Vec<RecordingSource>,
}

impl PipelineConfig {
    /// Load defaults, then the optional TOML file, then environment overrides.
    ///
    /// Relative recording paths are resolved against the file's directory.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut loaded: PipelineConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        if let Some(base) = path.and_then(Path::parent) {
            for recording in &mut loaded.recordings {
                if recording.path.is_relative() {
                    recording.path = base.join(&recording.path);
                }
            }
        }

        loaded.validate()?;
        Ok(loaded)
    }

    /// Checks that need the whole configuration
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.sanitizer.lower < self.sanitizer.upper) {
            return Err(PipelineError::Config(format!(
                "sanitizer range ({}, {}] is empty",
                self.sanitizer.lower, self.sanitizer.upper
            )));
        }
        for recording in &self.recordings {
            if recording.format == RecordingFormat::RawLog && recording.interval_ms.is_none() {
                return Err(PipelineError::Config(format!(
                    "raw log {} needs interval_ms",
                    recording.path.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::DegeneratePolicy;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.framing.frame_size, 30);
        assert_eq!(config.framing.overlap_percent, 50.0);
        assert_eq!(config.sanitizer.upper, 4096.0);
        assert_eq!(config.features.rolloff_fraction, 0.85);
        assert_eq!(config.split.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unit_id_from_file_stem() {
        let source = RecordingSource {
            path: PathBuf::from("data/raw/shout1.txt"),
            format: RecordingFormat::RawLog,
            label: Label::EVENT_A,
            interval_ms: Some(28),
            segmented: true,
            unit: None,
        };
        assert_eq!(source.unit_id(), "shout1");
    }

    #[test]
    fn test_raw_log_requires_interval() {
        let config = PipelineConfig {
            recordings: vec![RecordingSource {
                path: PathBuf::from("drill1.txt"),
                format: RecordingFormat::RawLog,
                label: Label::EVENT_B,
                interval_ms: None,
                segmented: true,
                unit: None,
            }],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(
            &path,
            r#"
[framing]
frame_size = 64
overlap_percent = 70.0

[features]
drop_dc_bin = true
degenerate_policy = "reject"

[[recordings]]
path = "shout1.txt"
format = "raw_log"
label = 1
interval_ms = 28
"#,
        )
        .unwrap();

        let config = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.framing.frame_size, 64);
        assert!(config.features.drop_dc_bin);
        assert_eq!(config.features.degenerate_policy, DegeneratePolicy::Reject);
        // Untouched sections keep their defaults
        assert_eq!(config.split.train, 0.7);
        assert_eq!(config.recordings.len(), 1);
        assert_eq!(config.recordings[0].label, Label::EVENT_A);
        assert!(config.recordings[0].segmented);
        assert_eq!(config.recordings[0].path, dir.path().join("shout1.txt"));
    }
}
