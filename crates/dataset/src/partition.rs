//! Partitions and Feature Matrices

use crate::error::DatasetError;
use feature_engine::{FeatureValues, FeatureVector, NormalizationParams, Provenance, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use signal_ingest::{Label, SourceUnit};
use std::collections::BTreeSet;
use std::fmt;
use std::io::{Read, Write};

/// Which group a partition is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    Train,
    Validation,
    Test,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 3] = [Self::Train, Self::Validation, Self::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Validation => "validation",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw feature vectors of one group
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    kind: PartitionKind,
    vectors: Vec<FeatureVector>,
}

impl Partition {
    pub fn new(kind: PartitionKind, vectors: Vec<FeatureVector>) -> Self {
        Self { kind, vectors }
    }

    pub fn kind(&self) -> PartitionKind {
        self.kind
    }

    pub fn vectors(&self) -> &[FeatureVector] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Source units represented in this partition
    pub fn units(&self) -> BTreeSet<SourceUnit> {
        self.vectors
            .iter()
            .map(|v| v.provenance.source_unit.clone())
            .collect()
    }

    /// Distinct labels present
    pub fn labels(&self) -> BTreeSet<Label> {
        self.vectors.iter().map(|v| v.label).collect()
    }

    /// Matrix view, optionally normalized with fixed parameters
    pub fn to_matrix(&self, normalization: Option<&NormalizationParams>) -> FeatureMatrix {
        let rows = self
            .vectors
            .iter()
            .map(|v| match normalization {
                Some(params) => params.apply(&v.values),
                None => v.values,
            })
            .collect();

        FeatureMatrix {
            feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            rows,
            labels: self.vectors.iter().map(|v| v.label).collect(),
            provenance: self.vectors.iter().map(|v| v.provenance.clone()).collect(),
        }
    }
}

/// Train/validation/test groups with no source unit shared between them
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub train: Partition,
    pub validation: Partition,
    pub test: Partition,
}

impl Dataset {
    pub fn partition(&self, kind: PartitionKind) -> &Partition {
        match kind {
            PartitionKind::Train => &self.train,
            PartitionKind::Validation => &self.validation,
            PartitionKind::Test => &self.test,
        }
    }

    /// Fail with `InsufficientData` when any partition is empty or the
    /// training partition holds a single class.
    pub fn ensure_trainable(&self) -> Result<(), DatasetError> {
        for kind in PartitionKind::ALL {
            if self.partition(kind).is_empty() {
                return Err(DatasetError::InsufficientData {
                    partition: kind,
                    reason: "no feature vectors".to_string(),
                });
            }
        }

        let labels = self.train.labels();
        if labels.len() < 2 {
            return Err(DatasetError::InsufficientData {
                partition: PartitionKind::Train,
                reason: format!("only {} class present", labels.len()),
            });
        }
        Ok(())
    }
}

/// Rows of 13 features in fixed column order, with integer labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    pub rows: Vec<FeatureValues>,
    pub labels: Vec<Label>,
    pub provenance: Vec<Provenance>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one feature column
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    /// Write as a JSON document
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), DatasetError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Read a JSON document written by [`Self::write_json`]
    pub fn read_json<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let matrix: Self = serde_json::from_reader(reader)?;
        if matrix.labels.len() != matrix.rows.len() || matrix.provenance.len() != matrix.rows.len() {
            return Err(DatasetError::Serialization(format!(
                "{} rows but {} labels and {} provenance entries",
                matrix.rows.len(),
                matrix.labels.len(),
                matrix.provenance.len()
            )));
        }
        Ok(matrix)
    }
}
