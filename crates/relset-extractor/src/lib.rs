//! relset Extractor - Sentence-level triple aggregation
//!
//! Turns annotated documents into training records:
//! - Expands each relation's entity span to sentence boundaries
//! - Merges overlapping sentence spans into one record
//! - Registers relation labels in a corpus-wide registry

pub mod aggregator;
pub mod interval;
pub mod sentence;

pub use aggregator::{Aggregation, TripleAggregator};
pub use interval::{IntervalMerger, Placement, PlacementKind};
pub use sentence::{DelimiterBoundaryFinder, SentenceBoundaryFinder};
