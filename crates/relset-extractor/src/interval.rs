//! Interval merging
//!
//! Holds one document's sentence intervals together with the triples
//! collected for each, in the order the intervals were first created.
//!
//! Placement is single-pass and first-match: a candidate is merged into
//! the first overlapping interval only. When spans chain (A overlaps B,
//! B overlaps C, A does not overlap C) the outcome depends on processing
//! order and two mutually overlapping intervals can survive unmerged.

use relset_core::{Interval, Triple};

/// How a candidate interval was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    /// No overlap; a new entry was appended
    Inserted,
    /// Candidate lies inside an existing interval
    Extended,
    /// The overlapping entry was widened and moved to the end
    Rekeyed { from: Interval },
    /// The widened interval already existed; the overlapping entry was
    /// folded into it
    Folded { from: Interval },
}

/// Result of [`IntervalMerger::place`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Index of the entry that receives the candidate's triples
    pub slot: usize,
    /// Interval of that entry after placement
    pub interval: Interval,
    pub kind: PlacementKind,
}

#[derive(Debug, Default)]
pub struct IntervalMerger {
    entries: Vec<(Interval, Vec<Triple>)>,
}

impl IntervalMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a candidate interval, merging with the first overlapping entry
    pub fn place(&mut self, candidate: Interval) -> Placement {
        let hit = self
            .entries
            .iter()
            .position(|(existing, _)| existing.overlaps(&candidate));

        let Some(index) = hit else {
            // inverted intervals never overlap, not even themselves
            if let Some(slot) = self.entries.iter().position(|(iv, _)| *iv == candidate) {
                return Placement {
                    slot,
                    interval: candidate,
                    kind: PlacementKind::Extended,
                };
            }
            self.entries.push((candidate, Vec::new()));
            return Placement {
                slot: self.entries.len() - 1,
                interval: candidate,
                kind: PlacementKind::Inserted,
            };
        };

        let existing = self.entries[index].0;
        let merged = existing.union(&candidate);
        if merged == existing {
            return Placement {
                slot: index,
                interval: existing,
                kind: PlacementKind::Extended,
            };
        }

        let (_, triples) = self.entries.remove(index);
        match self.entries.iter().position(|(iv, _)| *iv == merged) {
            Some(target) => {
                self.entries[target].1.extend(triples);
                Placement {
                    slot: target,
                    interval: merged,
                    kind: PlacementKind::Folded { from: existing },
                }
            }
            None => {
                self.entries.push((merged, triples));
                Placement {
                    slot: self.entries.len() - 1,
                    interval: merged,
                    kind: PlacementKind::Rekeyed { from: existing },
                }
            }
        }
    }

    /// Append a triple to the entry at `slot`
    pub fn push(&mut self, slot: usize, triple: Triple) {
        self.entries[slot].1.push(triple);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Intervals in entry order
    pub fn intervals(&self) -> Vec<Interval> {
        self.entries.iter().map(|(iv, _)| *iv).collect()
    }

    pub fn triples(&self, slot: usize) -> &[Triple] {
        &self.entries[slot].1
    }

    pub fn into_entries(self) -> Vec<(Interval, Vec<Triple>)> {
        self.entries
    }
}
