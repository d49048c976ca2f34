//! relset Dataset - Splitting and serialization
//!
//! Partitions aggregated records into train/validation/test with a
//! per-label stratified greedy splitter and writes them out in the
//! records, SPN and relation-registry formats.

pub mod export;
pub mod pipeline;
pub mod split;

pub use export::DatasetWriter;
pub use pipeline::{build_dataset, Dataset};
pub use split::{split, LabelShare, Split, SplitReport, StratifiedSplitter};
