//! relset Core - Domain models, errors and shared types
//!
//! This crate defines the core abstractions used throughout relset:
//! - Annotation input model (documents, label and relation entries)
//! - Aggregation output model (intervals, triples, records)
//! - The corpus-wide relation registry
//! - Common error types
//! - Text normalization
//! - Configuration management

pub mod config;
pub mod document;
pub mod text;

pub use config::{
    AppConfig, ConfigError, HoldoutConfig, InputConfig, LoggingConfig, OutputConfig, SplitConfig,
};
pub use document::{AnnotationEntry, Document, LabelValue};
pub use text::normalize;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for relset operations
#[derive(Error, Debug)]
pub enum RelsetError {
    #[error("Malformed annotation in document {document}, entry {entry}: {reason}")]
    MalformedAnnotation {
        document: String,
        entry: usize,
        reason: String,
    },

    #[error("Document {document} has no text field")]
    MissingText { document: String },

    #[error("Invalid train ratio: {0} (expected a value between 0 and 1)")]
    InvalidRatio(f64),

    #[error("IO error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RelsetError {
    /// Shorthand for a malformed-annotation error
    pub fn malformed(document: impl Into<String>, entry: usize, reason: impl Into<String>) -> Self {
        Self::MalformedAnnotation {
            document: document.into(),
            entry,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelsetError>;

// ============================================================================
// Spans
// ============================================================================

/// An annotated entity span, resolved from a `labels` entry.
///
/// `start` and `stop` are character offsets into the document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub start: usize,
    pub stop: usize,
}

/// Inclusive character interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Closed-interval overlap test
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.end >= other.start && self.start <= other.end
    }

    /// Smallest interval covering both
    pub fn union(&self, other: &Interval) -> Interval {
        Interval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

// ============================================================================
// Records
// ============================================================================

/// A (subject, predicate, object) triple.
///
/// Serialized as a three-element JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String, String)", into = "(String, String, String)")]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl From<(String, String, String)> for Triple {
    fn from((subject, predicate, object): (String, String, String)) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl From<Triple> for (String, String, String) {
    fn from(t: Triple) -> Self {
        (t.subject, t.predicate, t.object)
    }
}

/// One sentence-level training example: the sentence text and the
/// triples it expresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub text: String,
    pub triple_list: Vec<Triple>,
}

impl Record {
    pub fn new(text: impl Into<String>, triple_list: Vec<Triple>) -> Self {
        Self {
            text: text.into(),
            triple_list,
        }
    }

    /// Number of triples per predicate, in first-seen order
    pub fn label_counts(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for triple in &self.triple_list {
            match counts.iter_mut().find(|(l, _)| *l == triple.predicate) {
                Some((_, n)) => *n += 1,
                None => counts.push((triple.predicate.as_str(), 1)),
            }
        }
        counts
    }
}

// ============================================================================
// Relation Registry
// ============================================================================

/// Append-only mapping from relation label to a stable integer id.
///
/// Ids are assigned in first-seen order, so two runs over the same
/// documents in the same order produce the same mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationRegistry {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a label, returning its id (existing or freshly assigned)
    pub fn register(&mut self, label: &str) -> usize {
        if let Some(&id) = self.index.get(label) {
            return id;
        }
        let id = self.labels.len();
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), id);
        id
    }

    pub fn id(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn label(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(id, label)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().enumerate().map(|(i, l)| (i, l.as_str()))
    }
}

struct ForwardTable<'a>(&'a RelationRegistry);

impl Serialize for ForwardTable<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, label) in self.0.iter() {
            map.serialize_entry(&id.to_string(), label)?;
        }
        map.end()
    }
}

struct ReverseTable<'a>(&'a RelationRegistry);

impl Serialize for ReverseTable<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, label) in self.0.iter() {
            map.serialize_entry(label, &id)?;
        }
        map.end()
    }
}

/// Serialized as `[{"0": label, ...}, {label: 0, ...}]`
impl Serialize for RelationRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&ForwardTable(self))?;
        seq.serialize_element(&ReverseTable(self))?;
        seq.end()
    }
}

// ============================================================================
// Tests
// ============================================================================
