//! Sentence boundary resolution
//!
//! A deliberately naive delimiter scan: no abbreviation, ellipsis or
//! quotation handling. "Dr. Smith" splits after "Dr.".

use relset_core::Interval;

/// Expands a character span to the sentence that contains it
pub trait SentenceBoundaryFinder: Send + Sync {
    /// `chars` is the document text as chars; positions are char offsets
    fn resolve(&self, chars: &[char], begin_pos: usize, end_pos: usize) -> Interval;
}

/// Single-delimiter scanner.
///
/// The start lands two positions past the preceding delimiter (skipping
/// the delimiter and the space after it); the end is the following
/// delimiter itself.
#[derive(Debug, Clone, Copy)]
pub struct DelimiterBoundaryFinder {
    delimiter: char,
}

impl DelimiterBoundaryFinder {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }
}

impl Default for DelimiterBoundaryFinder {
    fn default() -> Self {
        Self::new('.')
    }
}

impl SentenceBoundaryFinder for DelimiterBoundaryFinder {
    fn resolve(&self, chars: &[char], begin_pos: usize, end_pos: usize) -> Interval {
        let Some(last) = chars.len().checked_sub(1) else {
            return Interval::new(0, 0);
        };

        let begin = begin_pos.min(last);
        let start = chars[..=begin]
            .iter()
            .rposition(|&c| c == self.delimiter)
            .map_or(0, |i| i + 2);

        let end = chars
            .iter()
            .skip(end_pos)
            .position(|&c| c == self.delimiter)
            .map_or(last, |i| i + end_pos);

        Interval::new(start, end)
    }
}

/// Text covered by `interval`; empty when the interval is inverted or
/// starts past the end
pub fn substring(chars: &[char], interval: Interval) -> String {
    if interval.start > interval.end || interval.start >= chars.len() {
        return String::new();
    }
    let end = interval.end.min(chars.len() - 1);
    chars[interval.start..=end].iter().collect()
}
