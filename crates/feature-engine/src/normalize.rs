//! Z-Score Normalization Parameters

use crate::error::FeatureError;
use crate::features::{FeatureValues, FEATURE_DIMENSION};
use serde::{Deserialize, Serialize};

/// Default guard added to the standard deviation
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Per-feature mean and standard deviation fixed from a training partition.
///
/// Immutable once built: the same instance is applied unchanged to every
/// partition of a run. Only written to disk through [`Self::to_bytes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    mean: FeatureValues,
    std: FeatureValues,
    epsilon: f64,
}

impl NormalizationParams {
    pub fn new(mean: FeatureValues, std: FeatureValues, epsilon: f64) -> Result<Self, FeatureError> {
        if !(epsilon >= 0.0) {
            return Err(FeatureError::InvalidConfiguration(format!(
                "normalization epsilon must be non-negative, got {}",
                epsilon
            )));
        }
        if std.iter().any(|s| !(*s >= 0.0)) {
            return Err(FeatureError::InvalidConfiguration(
                "standard deviations must be non-negative".to_string(),
            ));
        }
        Ok(Self { mean, std, epsilon })
    }

    /// Build from slices, checking their length
    pub fn from_slices(mean: &[f64], std: &[f64], epsilon: f64) -> Result<Self, FeatureError> {
        let mean: FeatureValues = mean.try_into().map_err(|_| FeatureError::ShapeMismatch {
            expected: FEATURE_DIMENSION,
            actual: mean.len(),
        })?;
        let std: FeatureValues = std.try_into().map_err(|_| FeatureError::ShapeMismatch {
            expected: FEATURE_DIMENSION,
            actual: std.len(),
        })?;
        Self::new(mean, std, epsilon)
    }

    pub fn mean(&self) -> &FeatureValues {
        &self.mean
    }

    pub fn std(&self) -> &FeatureValues {
        &self.std
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// `(value - mean) / (std + epsilon)` per feature
    pub fn apply(&self, values: &FeatureValues) -> FeatureValues {
        let mut out = [0.0; FEATURE_DIMENSION];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = (values[i] - self.mean[i]) / (self.std[i] + self.epsilon);
        }
        out
    }

    /// Encode for explicit persistence
    pub fn to_bytes(&self) -> Result<Vec<u8>, FeatureError> {
        Ok(postcard::to_allocvec(self)?)
    }

    /// Decode parameters written by [`Self::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FeatureError> {
        let params: Self = postcard::from_bytes(bytes)?;
        Self::new(params.mean, params.std, params.epsilon)
    }
}
