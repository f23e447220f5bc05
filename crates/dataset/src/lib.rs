//! Dataset Preparation
//!
//! Leakage-safe train/validation/test partitioning by source unit, z-score
//! normalization fitted on training data only, and the hand-off to a
//! downstream classifier.

mod classifier;
mod error;
mod normalizer;
mod partition;
mod splitter;

pub use classifier::{accuracy, Classifier, NearestCentroid};
pub use error::DatasetError;
pub use normalizer::{Normalizer, NormalizerConfig, PreparedDataset};
pub use partition::{Dataset, FeatureMatrix, Partition, PartitionKind};
pub use splitter::{DatasetSplitter, SplitConfig, UnitAssignment};
