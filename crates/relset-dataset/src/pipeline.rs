//! Three-way dataset assembly
//!
//! With holdout records available they form the test split and the
//! training records are split into train/validation. Without them the
//! training records are first split into (pool, test) and the pool then
//! into train/validation.

use relset_core::{Record, RelationRegistry, Result, SplitConfig};

use crate::export::DatasetWriter;
use crate::split::{SplitReport, StratifiedSplitter};

pub const TRAIN: &str = "train";
pub const VALIDATION: &str = "validation";
pub const TEST: &str = "test";

/// Final train/validation/test record sets
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub train: Vec<Record>,
    pub validation: Vec<Record>,
    pub test: Vec<Record>,
    /// Reports of each split pass, named by what was divided
    pub reports: Vec<(String, SplitReport)>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splits by output name, in writing order
    pub fn splits(&self) -> [(&'static str, &[Record]); 3] {
        [
            (TRAIN, &self.train),
            (VALIDATION, &self.validation),
            (TEST, &self.test),
        ]
    }

    /// Write all three splits and the registry
    pub fn write(&self, writer: &DatasetWriter, registry: &RelationRegistry) -> Result<()> {
        for (name, records) in self.splits() {
            writer.write_split(name, records)?;
        }
        writer.write_registry(registry)
    }
}

/// Assemble train/validation/test from training and holdout records
pub fn build_dataset(
    training: Vec<Record>,
    holdout: Vec<Record>,
    config: &SplitConfig,
) -> Result<Dataset> {
    let train_splitter = StratifiedSplitter::new(config.train_ratio)?;
    let mut reports = Vec::new();

    let (pool, test) = if holdout.is_empty() {
        let test_splitter = StratifiedSplitter::new(config.test_ratio)?;
        let split = test_splitter.split(training);
        split.report.log("pool/test");
        reports.push(("pool/test".to_string(), split.report));
        (split.train, split.test)
    } else {
        (training, holdout)
    };

    let split = train_splitter.split(pool);
    split.report.log("train/validation");
    reports.push(("train/validation".to_string(), split.report));

    let dataset = Dataset {
        train: split.train,
        validation: split.test,
        test,
        reports,
    };
    tracing::info!(
        "Dataset: {} train, {} validation, {} test",
        dataset.train.len(),
        dataset.validation.len(),
        dataset.test.len()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relset_core::Triple;

    fn records(prefix: &str, n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new(format!("{prefix}{i}"), vec![Triple::new("s", "rel", "o")]))
            .collect()
    }

    #[test]
    fn test_holdout_becomes_test() {
        let dataset =
            build_dataset(records("t", 50), records("h", 7), &SplitConfig::default()).unwrap();

        assert_eq!(dataset.test.len(), 7);
        assert!(dataset.test.iter().all(|r| r.text.starts_with('h')));
        assert_eq!(dataset.train.len() + dataset.validation.len(), 50);
        assert_eq!(dataset.reports.len(), 1);
    }

    #[test]
    fn test_without_holdout_splits_twice() {
        let dataset =
            build_dataset(records("t", 100), Vec::new(), &SplitConfig::default()).unwrap();

        assert_eq!(dataset.len(), 100);
        assert!(!dataset.test.is_empty());
        assert!(!dataset.validation.is_empty());
        assert!(dataset.train.len() > dataset.validation.len());
        assert_eq!(dataset.reports.len(), 2);
        assert_eq!(dataset.reports[0].0, "pool/test");
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let config = SplitConfig {
            train_ratio: 2.0,
            test_ratio: 0.8,
        };
        assert!(build_dataset(records("t", 3), Vec::new(), &config).is_err());
    }

    #[test]
    fn test_empty_everything() {
        let dataset = build_dataset(Vec::new(), Vec::new(), &SplitConfig::default()).unwrap();
        assert!(dataset.is_empty());
    }
}
