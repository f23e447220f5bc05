//! Classifier Hand-Off
//!
//! Any supervised learner taking a feature matrix and integer labels fits
//! behind [`Classifier`]. [`NearestCentroid`] is a dependency-free baseline
//! for reporting when no external learner is attached.

use crate::error::DatasetError;
use crate::partition::{FeatureMatrix, PartitionKind};
use feature_engine::{FeatureValues, FEATURE_DIMENSION};
use signal_ingest::Label;
use std::collections::BTreeMap;

/// Downstream classifier contract
pub trait Classifier {
    /// Learn from a training matrix
    fn fit(&mut self, matrix: &FeatureMatrix) -> Result<(), DatasetError>;

    /// Predict one label per row
    fn predict(&self, rows: &[FeatureValues]) -> Result<Vec<Label>, DatasetError>;
}

/// Fraction of predictions matching the expected labels (0.0 when empty)
pub fn accuracy(predicted: &[Label], expected: &[Label]) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(expected)
        .filter(|(p, e)| p == e)
        .count();
    correct as f64 / expected.len() as f64
}

/// Assigns each row to the class with the closest mean vector
#[derive(Debug, Clone, Default)]
pub struct NearestCentroid {
    centroids: BTreeMap<Label, FeatureValues>,
}

impl NearestCentroid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn centroid(&self, label: Label) -> Option<&FeatureValues> {
        self.centroids.get(&label)
    }
}

impl Classifier for NearestCentroid {
    fn fit(&mut self, matrix: &FeatureMatrix) -> Result<(), DatasetError> {
        if matrix.is_empty() {
            return Err(DatasetError::InsufficientData {
                partition: PartitionKind::Train,
                reason: "no rows to fit".to_string(),
            });
        }

        let mut sums: BTreeMap<Label, (FeatureValues, usize)> = BTreeMap::new();
        for (row, label) in matrix.rows.iter().zip(&matrix.labels) {
            let (sum, count) = sums.entry(*label).or_insert(([0.0; FEATURE_DIMENSION], 0));
            for (s, v) in sum.iter_mut().zip(row) {
                *s += v;
            }
            *count += 1;
        }

        self.centroids = sums
            .into_iter()
            .map(|(label, (mut sum, count))| {
                sum.iter_mut().for_each(|s| *s /= count as f64);
                (label, sum)
            })
            .collect();
        Ok(())
    }

    fn predict(&self, rows: &[FeatureValues]) -> Result<Vec<Label>, DatasetError> {
        if self.centroids.is_empty() {
            return Err(DatasetError::NotFitted);
        }

        Ok(rows
            .iter()
            .map(|row| {
                let mut best = (Label::BACKGROUND, f64::INFINITY);
                for (label, centroid) in &self.centroids {
                    let distance: f64 = row
                        .iter()
                        .zip(centroid)
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum();
                    // Strict comparison keeps the lowest label on ties
                    if distance < best.1 {
                        best = (*label, distance);
                    }
                }
                best.0
            })
            .collect())
    }
}
