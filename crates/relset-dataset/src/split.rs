//! Stratified splitting
//!
//! Greedy online bin balancing: each record goes to whichever side is
//! currently less over its per-label quota. Not an optimal partition;
//! the result depends on record order and is deterministic for a fixed
//! order and ratio.

use std::collections::HashMap;

use serde::Serialize;

use relset_core::{Record, RelsetError, Result};

// ============================================================================
// Report
// ============================================================================

/// Share of one label's triples that ended up on each side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelShare {
    pub label: String,
    pub total: usize,
    /// `train_count / total`, rounded to 2 decimals
    pub train: f64,
    /// `test_count / total`, rounded to 2 decimals
    pub test: f64,
}

/// Diagnostic per-label distribution of a split, in first-seen label order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SplitReport {
    pub shares: Vec<LabelShare>,
}

impl SplitReport {
    pub fn share(&self, label: &str) -> Option<&LabelShare> {
        self.shares.iter().find(|s| s.label == label)
    }

    pub fn log(&self, name: &str) {
        for share in &self.shares {
            tracing::info!(
                "{} split: {} (n={}) primary={:.2} secondary={:.2}",
                name,
                share.label,
                share.total,
                share.train,
                share.test
            );
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Splitter
// ============================================================================

/// Result of one split call
#[derive(Debug, Clone, Default)]
pub struct Split {
    pub train: Vec<Record>,
    pub test: Vec<Record>,
    pub report: SplitReport,
}

#[derive(Debug, Clone, Copy)]
pub struct StratifiedSplitter {
    train_ratio: f64,
}

impl StratifiedSplitter {
    /// `train_ratio` must lie in `[0, 1]`
    pub fn new(train_ratio: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&train_ratio) {
            return Err(RelsetError::InvalidRatio(train_ratio));
        }
        Ok(Self { train_ratio })
    }

    pub fn split(&self, records: Vec<Record>) -> Split {
        // label -> dense index, first-seen order
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut labels: Vec<String> = Vec::new();
        let mut total: Vec<usize> = Vec::new();

        let record_labels: Vec<Vec<usize>> = records
            .iter()
            .map(|record| {
                record
                    .triple_list
                    .iter()
                    .map(|t| {
                        let id = *index.entry(t.predicate.clone()).or_insert_with(|| {
                            labels.push(t.predicate.clone());
                            total.push(0);
                            labels.len() - 1
                        });
                        total[id] += 1;
                        id
                    })
                    .collect()
            })
            .collect();

        let train_quota: Vec<f64> = total
            .iter()
            .map(|&n| self.train_ratio * n as f64)
            .collect();
        let test_quota: Vec<f64> = total
            .iter()
            .map(|&n| (1.0 - self.train_ratio) * n as f64)
            .collect();

        let mut train_count = vec![0usize; labels.len()];
        let mut test_count = vec![0usize; labels.len()];
        let mut split = Split::default();

        for (record, ids) in records.into_iter().zip(record_labels) {
            let overshoot = |counts: &[usize], quota: &[f64]| -> f64 {
                ids.iter()
                    .map(|&l| (counts[l] as f64 - quota[l]).max(0.0))
                    .sum()
            };
            let train_cost = overshoot(&train_count, &train_quota);
            let test_cost = overshoot(&test_count, &test_quota);

            if train_cost <= test_cost {
                for &l in &ids {
                    train_count[l] += 1;
                }
                split.train.push(record);
            } else {
                for &l in &ids {
                    test_count[l] += 1;
                }
                split.test.push(record);
            }
        }

        split.report = SplitReport {
            shares: labels
                .into_iter()
                .enumerate()
                .map(|(l, label)| LabelShare {
                    label,
                    total: total[l],
                    train: round2(train_count[l] as f64 / total[l] as f64),
                    test: round2(test_count[l] as f64 / total[l] as f64),
                })
                .collect(),
        };
        split
    }
}

/// Split `records` into `(train, test)` aiming at `train_ratio` per label
pub fn split(records: Vec<Record>, train_ratio: f64) -> Result<Split> {
    Ok(StratifiedSplitter::new(train_ratio)?.split(records))
}

// ============================================================================
// Tests
// ============================================================================
