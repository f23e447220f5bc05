//! Z-Score Normalization Fitted on the Training Partition

use crate::error::DatasetError;
use crate::partition::{Dataset, FeatureMatrix, Partition, PartitionKind};
use feature_engine::{NormalizationParams, DEFAULT_EPSILON, FEATURE_DIMENSION};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Normalizer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Added to every standard deviation before dividing
    pub epsilon: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Computes per-feature mean and population standard deviation
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

/// Normalized matrices of every partition plus the parameters used
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDataset {
    pub params: NormalizationParams,
    pub train: FeatureMatrix,
    pub validation: FeatureMatrix,
    pub test: FeatureMatrix,
}

impl PreparedDataset {
    pub fn matrix(&self, kind: PartitionKind) -> &FeatureMatrix {
        match kind {
            PartitionKind::Train => &self.train,
            PartitionKind::Validation => &self.validation,
            PartitionKind::Test => &self.test,
        }
    }
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Fit parameters from the training partition.
    ///
    /// Validation and test partitions are refused outright.
    pub fn fit(&self, partition: &Partition) -> Result<NormalizationParams, DatasetError> {
        if partition.kind() != PartitionKind::Train {
            return Err(DatasetError::FitOnEvaluationPartition(partition.kind()));
        }
        if partition.is_empty() {
            return Err(DatasetError::InsufficientData {
                partition: PartitionKind::Train,
                reason: "cannot fit normalization on zero vectors".to_string(),
            });
        }

        let n = partition.len() as f64;
        let mut mean = [0.0; FEATURE_DIMENSION];
        for vector in partition.vectors() {
            for (m, v) in mean.iter_mut().zip(vector.values.iter()) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut std = [0.0; FEATURE_DIMENSION];
        for vector in partition.vectors() {
            for (i, s) in std.iter_mut().enumerate() {
                let d = vector.values[i] - mean[i];
                *s += d * d;
            }
        }
        std.iter_mut().for_each(|s| *s = (*s / n).sqrt());

        debug!("Normalization fitted on {} training vectors", partition.len());
        Ok(NormalizationParams::new(mean, std, self.config.epsilon)?)
    }

    /// Fit on the training partition, then apply the same parameters to all
    /// three partitions.
    pub fn prepare(&self, dataset: &Dataset) -> Result<PreparedDataset, DatasetError> {
        let params = self.fit(&dataset.train)?;

        let prepared = PreparedDataset {
            train: dataset.train.to_matrix(Some(&params)),
            validation: dataset.validation.to_matrix(Some(&params)),
            test: dataset.test.to_matrix(Some(&params)),
            params,
        };

        info!(
            "Prepared matrices: train={} validation={} test={}",
            prepared.train.len(),
            prepared.validation.len(),
            prepared.test.len()
        );
        Ok(prepared)
    }
}
