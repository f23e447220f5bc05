//! Leakage-Safe Dataset Splitter
//!
//! Overlapping frames of one recording are near duplicates, so the split is
//! drawn over source units and every frame follows its unit.

use crate::error::DatasetError;
use crate::partition::{Dataset, Partition, PartitionKind};
use feature_engine::FeatureVector;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use signal_ingest::{Label, SourceUnit};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Absorbs representation error so that e.g. 0.7 * 10 counts as 7
const COUNT_TOLERANCE: f64 = 1e-9;

/// Split proportions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of units assigned to training
    pub train: f64,
    /// Fraction of the remaining units assigned to validation; the rest is test
    pub validation_of_remainder: f64,
    /// Shuffle seed
    pub seed: u64,
    /// Split each label stratum separately
    pub stratified: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train: 0.7,
            validation_of_remainder: 0.5,
            seed: 42,
            stratified: true,
        }
    }
}

impl SplitConfig {
    /// Build from absolute proportions, e.g. (0.7, 0.15) for a 70/15/15 split
    pub fn from_absolute(train: f64, validation: f64, seed: u64) -> Result<Self, DatasetError> {
        if !(train < 1.0) {
            return Err(DatasetError::InvalidRatio(format!(
                "train proportion {} leaves nothing for validation",
                train
            )));
        }
        Ok(Self {
            train,
            validation_of_remainder: validation / (1.0 - train),
            seed,
            ..Default::default()
        })
    }
}

/// Unit to partition mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitAssignment {
    assignments: BTreeMap<SourceUnit, PartitionKind>,
}

impl UnitAssignment {
    pub fn kind_of(&self, unit: &SourceUnit) -> Option<PartitionKind> {
        self.assignments.get(unit).copied()
    }

    /// Units assigned to one partition, in id order
    pub fn units(&self, kind: PartitionKind) -> Vec<&SourceUnit> {
        self.assignments
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(unit, _)| unit)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Partitions source units into train/validation/test
#[derive(Debug, Clone, Copy)]
pub struct DatasetSplitter {
    config: SplitConfig,
}

impl DatasetSplitter {
    pub fn new(config: SplitConfig) -> Result<Self, DatasetError> {
        if !(config.train > 0.0 && config.train <= 1.0) {
            return Err(DatasetError::InvalidRatio(format!(
                "train proportion must be in (0, 1], got {}",
                config.train
            )));
        }
        if !(0.0..=1.0).contains(&config.validation_of_remainder) {
            return Err(DatasetError::InvalidRatio(format!(
                "validation proportion of remainder must be in [0, 1], got {}",
                config.validation_of_remainder
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Assign each unit to exactly one partition.
    ///
    /// Units are sorted before the seeded shuffle, so the result depends only
    /// on the set of units, their strata and the seed.
    pub fn assign_units(&self, units: &[(SourceUnit, Label)]) -> UnitAssignment {
        let mut strata: BTreeMap<Option<Label>, Vec<SourceUnit>> = BTreeMap::new();
        for (unit, label) in units {
            let key = self.config.stratified.then_some(*label);
            strata.entry(key).or_default().push(unit.clone());
        }

        let mut assignments = BTreeMap::new();
        for (_, mut members) in strata {
            members.sort();
            members.dedup();

            let mut rng = StdRng::seed_from_u64(self.config.seed);
            members.shuffle(&mut rng);

            let (n_train, n_validation) = self.counts(members.len());
            for (i, unit) in members.into_iter().enumerate() {
                let kind = if i < n_train {
                    PartitionKind::Train
                } else if i < n_train + n_validation {
                    PartitionKind::Validation
                } else {
                    PartitionKind::Test
                };
                assignments.insert(unit, kind);
            }
        }

        UnitAssignment { assignments }
    }

    /// Train and validation counts for `n` units; the rest go to test
    fn counts(&self, n: usize) -> (usize, usize) {
        let n_train = ((self.config.train * n as f64) + COUNT_TOLERANCE).floor() as usize;
        let n_train = n_train.min(n);
        let remainder = n - n_train;
        let n_validation =
            ((self.config.validation_of_remainder * remainder as f64) + COUNT_TOLERANCE).floor() as usize;
        (n_train, n_validation.min(remainder))
    }

    /// Split feature vectors by their source unit.
    ///
    /// A unit's stratum is its most frequent label (lowest code on ties).
    pub fn split(&self, vectors: Vec<FeatureVector>) -> Result<Dataset, DatasetError> {
        let mut label_counts: BTreeMap<SourceUnit, BTreeMap<Label, usize>> = BTreeMap::new();
        for vector in &vectors {
            *label_counts
                .entry(vector.provenance.source_unit.clone())
                .or_default()
                .entry(vector.label)
                .or_default() += 1;
        }

        let units: Vec<(SourceUnit, Label)> = label_counts
            .into_iter()
            .filter_map(|(unit, counts)| {
                let mut best: Option<(Label, usize)> = None;
                for (label, count) in counts {
                    if best.map_or(true, |(_, c)| count > c) {
                        best = Some((label, count));
                    }
                }
                best.map(|(label, _)| (unit, label))
            })
            .collect();

        let assignment = self.assign_units(&units);

        let mut groups: HashMap<PartitionKind, Vec<FeatureVector>> = HashMap::new();
        for vector in vectors {
            let kind = assignment
                .kind_of(&vector.provenance.source_unit)
                .ok_or_else(|| {
                    DatasetError::InvalidRatio(format!(
                        "unit {} missing from assignment",
                        vector.provenance.source_unit
                    ))
                })?;
            groups.entry(kind).or_default().push(vector);
        }

        let mut take = |kind: PartitionKind| Partition::new(kind, groups.remove(&kind).unwrap_or_default());
        let dataset = Dataset {
            train: take(PartitionKind::Train),
            validation: take(PartitionKind::Validation),
            test: take(PartitionKind::Test),
        };

        info!(
            "Dataset split: {} train units ({} vectors), {} validation units ({} vectors), {} test units ({} vectors)",
            assignment.units(PartitionKind::Train).len(),
            dataset.train.len(),
            assignment.units(PartitionKind::Validation).len(),
            dataset.validation.len(),
            assignment.units(PartitionKind::Test).len(),
            dataset.test.len()
        );

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::tests::vector;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn units(n: usize, label: Label) -> Vec<(SourceUnit, Label)> {
        (0..n)
            .map(|i| (SourceUnit::new(format!("{}-{:02}", label.name(), i)), label))
            .collect()
    }

    #[test]
    fn test_counts() {
        let splitter = DatasetSplitter::new(SplitConfig::default()).unwrap();
        assert_eq!(splitter.counts(10), (7, 1));
        assert_eq!(splitter.counts(20), (14, 3));
        assert_eq!(splitter.counts(0), (0, 0));
    }

    #[test]
    fn test_from_absolute() {
        let config = SplitConfig::from_absolute(0.8, 0.1, 7).unwrap();
        assert!((config.validation_of_remainder - 0.5).abs() < 1e-12);
        assert_eq!(config.seed, 7);
        assert!(SplitConfig::from_absolute(1.0, 0.0, 7).is_err());
    }

    #[test]
    fn test_invalid_ratios() {
        let bad_train = SplitConfig { train: 0.0, ..Default::default() };
        assert!(DatasetSplitter::new(bad_train).is_err());
        let bad_val = SplitConfig {
            validation_of_remainder: 1.5,
            ..Default::default()
        };
        assert!(DatasetSplitter::new(bad_val).is_err());
    }

    #[test]
    fn test_assignment_independent_of_input_order() {
        let splitter = DatasetSplitter::new(SplitConfig::default()).unwrap();
        let mut list = units(12, Label::EVENT_A);
        let first = splitter.assign_units(&list);
        list.reverse();
        assert_eq!(splitter.assign_units(&list), first);
    }

    #[test]
    fn test_seed_changes_assignment() {
        let list = units(30, Label::EVENT_A);
        let a = DatasetSplitter::new(SplitConfig { seed: 1, ..Default::default() })
            .unwrap()
            .assign_units(&list);
        let b = DatasetSplitter::new(SplitConfig { seed: 2, ..Default::default() })
            .unwrap()
            .assign_units(&list);
        assert_eq!(a.units(PartitionKind::Train).len(), b.units(PartitionKind::Train).len());
        assert_ne!(a, b);
    }

    #[test]
    fn test_stratified_split_per_class() {
        let mut list = units(10, Label::BACKGROUND);
        list.extend(units(10, Label::EVENT_A));
        let assignment = DatasetSplitter::new(SplitConfig::default()).unwrap().assign_units(&list);

        let train = assignment.units(PartitionKind::Train);
        let background = train.iter().filter(|u| u.as_str().starts_with("background")).count();
        assert_eq!(train.len(), 14);
        assert_eq!(background, 7);
    }

    #[test]
    fn test_frames_follow_their_unit() {
        let mut vectors = Vec::new();
        for unit in 0..10 {
            let label = if unit % 2 == 0 { Label::BACKGROUND } else { Label::EVENT_B };
            for frame in 0..5 {
                vectors.push(vector(&format!("rec{}", unit), frame, label, unit as f64));
            }
        }

        let dataset = DatasetSplitter::new(SplitConfig::default()).unwrap().split(vectors).unwrap();
        assert_eq!(dataset.train.len() + dataset.validation.len() + dataset.test.len(), 50);
        for partition in [&dataset.train, &dataset.validation, &dataset.test] {
            assert_eq!(partition.len() % 5, 0);
        }
        assert!(dataset.train.units().is_disjoint(&dataset.test.units()));
        assert!(dataset.train.units().is_disjoint(&dataset.validation.units()));
    }

    proptest! {
        #[test]
        fn units_land_in_exactly_one_partition(
            frames_per_unit in proptest::collection::vec((1usize..6, 0u16..3), 1..40),
            seed in any::<u64>(),
            stratified in any::<bool>(),
        ) {
            let mut vectors = Vec::new();
            for (unit, (frames, label)) in frames_per_unit.iter().enumerate() {
                for frame in 0..*frames {
                    vectors.push(vector(&format!("u{}", unit), frame as u64, Label(*label), 0.0));
                }
            }
            let total = vectors.len();
            let config = SplitConfig { seed, stratified, ..Default::default() };
            let dataset = DatasetSplitter::new(config).unwrap().split(vectors).unwrap();

            let train = dataset.train.units();
            let validation = dataset.validation.units();
            let test = dataset.test.units();
            prop_assert!(train.is_disjoint(&validation));
            prop_assert!(train.is_disjoint(&test));
            prop_assert!(validation.is_disjoint(&test));

            let all: BTreeSet<_> = train.union(&validation).cloned().collect::<BTreeSet<_>>()
                .union(&test).cloned().collect();
            prop_assert_eq!(all.len(), frames_per_unit.len());
            prop_assert_eq!(dataset.train.len() + dataset.validation.len() + dataset.test.len(), total);
        }
    }
}
