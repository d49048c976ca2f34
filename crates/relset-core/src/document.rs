//! Annotation input model
//!
//! Mirrors the `result` entries of a Label Studio export. Fields are
//! optional at this level so that a missing field surfaces as a
//! per-document `MalformedAnnotation` during aggregation instead of a
//! deserialization failure for the whole file.

use serde::Deserialize;

/// Span payload of a `labels` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelValue {
    pub text: Option<String>,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

/// One entry of an annotation `result` list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum AnnotationEntry {
    /// Entity span
    #[serde(rename = "labels")]
    Label {
        id: Option<String>,
        value: Option<LabelValue>,
    },

    /// Labeled relation between two entity spans
    #[serde(rename = "relation")]
    Relation {
        from_id: Option<String>,
        to_id: Option<String>,
        labels: Option<Vec<String>>,
    },

    /// Any other entry kind (choices, ratings, ...)
    #[serde(other)]
    Other,
}

impl AnnotationEntry {
    /// Build a complete `labels` entry
    pub fn label(id: impl Into<String>, text: impl Into<String>, start: usize, end: usize) -> Self {
        Self::Label {
            id: Some(id.into()),
            value: Some(LabelValue {
                text: Some(text.into()),
                start: Some(start),
                end: Some(end),
            }),
        }
    }

    /// Build a complete `relation` entry
    pub fn relation(
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        labels: &[&str],
    ) -> Self {
        Self::Relation {
            from_id: Some(from_id.into()),
            to_id: Some(to_id.into()),
            labels: Some(labels.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, Self::Relation { .. })
    }
}

/// An annotated document: raw text plus its entries in export order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Source identifier used in error messages (e.g. `file.json[3]`)
    pub id: String,
    pub text: String,
    pub entries: Vec<AnnotationEntry>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_entries(mut self, entries: impl IntoIterator<Item = AnnotationEntry>) -> Self {
        self.entries.extend(entries);
        self
    }
}
