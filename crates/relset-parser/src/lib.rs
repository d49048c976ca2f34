//! relset Parser - Annotation export loading
//!
//! Reads Label Studio JSON exports into [`Document`]s:
//! - Resolves input files from a glob pattern
//! - Repairs the legacy `"0"` text key
//! - Flattens every annotation's `result` list into one entry sequence
//!
//! Malformed documents are collected as failures next to the documents
//! that parsed, so one bad task does not sink the whole export.

pub mod holdout;

pub use holdout::HoldoutRouter;

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use relset_core::{AnnotationEntry, Document, RelsetError, Result};

/// Key under which older exports store the document text
pub const LEGACY_TEXT_KEY: &str = "0";

// ============================================================================
// Corpus
// ============================================================================

/// Documents loaded from one or more export files
#[derive(Debug, Default)]
pub struct Corpus {
    /// Successfully parsed documents, in file then task order
    pub documents: Vec<Document>,
    /// Per-document failures
    pub failures: Vec<RelsetError>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn absorb(&mut self, other: Corpus) {
        self.documents.extend(other.documents);
        self.failures.extend(other.failures);
    }
}

// ============================================================================
// File resolution
// ============================================================================

/// Resolve a glob pattern to a sorted, de-duplicated list of files
pub fn resolve_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)
        .map_err(|e| RelsetError::Config(format!("Invalid glob pattern {pattern}: {e}")))?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| RelsetError::Io {
            path: e.path().to_path_buf(),
            source: e.into(),
        })?;
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Load every export file matched by `pattern`
pub fn load_corpus(pattern: &str) -> Result<Corpus> {
    let files = resolve_pattern(pattern)?;
    tracing::info!("Loading {} annotation file(s) from {}", files.len(), pattern);

    let mut corpus = Corpus::default();
    for file in &files {
        corpus.absorb(load_file(file)?);
    }
    Ok(corpus)
}

/// Load one export file (a JSON array of tasks)
pub fn load_file(path: &Path) -> Result<Corpus> {
    let content = std::fs::read(path).map_err(|e| RelsetError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let tasks: Vec<Value> = serde_json::from_slice(&content).map_err(|e| RelsetError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;

    let corpus = parse_tasks(&path.display().to_string(), tasks);
    tracing::debug!(
        "Parsed {} document(s) from {} ({} failed)",
        corpus.documents.len(),
        path.display(),
        corpus.failures.len()
    );
    Ok(corpus)
}

/// Parse already-decoded tasks; `source` prefixes document ids
pub fn parse_tasks(source: &str, tasks: Vec<Value>) -> Corpus {
    let mut corpus = Corpus::default();
    for (index, task) in tasks.into_iter().enumerate() {
        let id = format!("{source}[{index}]");
        match parse_task(id, task) {
            Ok(document) => corpus.documents.push(document),
            Err(e) => {
                tracing::warn!("Skipping document: {}", e);
                corpus.failures.push(e);
            }
        }
    }
    corpus
}

// ============================================================================
// Task parsing
// ============================================================================

/// Rename the legacy text key to `text` when `text` is absent.
///
/// Returns whether a rename happened.
pub fn fix_legacy_text_key(data: &mut Map<String, Value>) -> bool {
    if data.contains_key("text") {
        return false;
    }
    match data.remove(LEGACY_TEXT_KEY) {
        Some(text) => {
            data.insert("text".to_string(), text);
            true
        }
        None => false,
    }
}

/// Parse one task object into a [`Document`]
pub fn parse_task(id: String, task: Value) -> Result<Document> {
    let Value::Object(mut task) = task else {
        return Err(RelsetError::malformed(id, 0, "task is not a JSON object"));
    };

    let text = match task.get_mut("data") {
        Some(Value::Object(data)) => {
            fix_legacy_text_key(data);
            match data.remove("text") {
                Some(Value::String(text)) => text,
                Some(_) => return Err(RelsetError::malformed(id, 0, "data.text is not a string")),
                None => return Err(RelsetError::MissingText { document: id }),
            }
        }
        _ => return Err(RelsetError::MissingText { document: id }),
    };

    let mut entries = Vec::new();
    if let Some(Value::Array(annotations)) = task.remove("annotations") {
        for annotation in annotations {
            let results = match annotation {
                Value::Object(mut annotation) => annotation.remove("result"),
                _ => None,
            };
            let Some(Value::Array(results)) = results else {
                continue;
            };
            for result in results {
                let entry: AnnotationEntry = serde_json::from_value(result).map_err(|e| {
                    RelsetError::malformed(id.clone(), entries.len(), e.to_string())
                })?;
                entries.push(entry);
            }
        }
    }

    Ok(Document::new(id, text).with_entries(entries))
}

// ============================================================================
// Tests
// ============================================================================
