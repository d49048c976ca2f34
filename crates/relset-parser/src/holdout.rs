//! Document-level holdout routing
//!
//! Documents whose opening characters mention a holdout keyword are kept
//! out of training entirely and form the test pool.

use relset_core::{Document, HoldoutConfig};

/// Routes documents to the training or holdout pool by keyword
#[derive(Debug, Clone)]
pub struct HoldoutRouter {
    keywords: Vec<String>,
    window: usize,
}

impl HoldoutRouter {
    pub fn new(keywords: Vec<String>, window: usize) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            window,
        }
    }

    pub fn from_config(config: &HoldoutConfig) -> Self {
        Self::new(config.keywords.clone(), config.window)
    }

    /// Whether any keyword occurs in the first `window` chars (case-insensitive)
    pub fn is_holdout(&self, document: &Document) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let head: String = document.text.chars().take(self.window).collect();
        let head = head.to_lowercase();
        self.keywords.iter().any(|k| head.contains(k.as_str()))
    }

    /// Split documents into `(training, holdout)`, preserving order
    pub fn partition(&self, documents: Vec<Document>) -> (Vec<Document>, Vec<Document>) {
        let (holdout, training): (Vec<_>, Vec<_>) =
            documents.into_iter().partition(|d| self.is_holdout(d));
        (training, holdout)
    }
}

impl Default for HoldoutRouter {
    fn default() -> Self {
        Self::from_config(&HoldoutConfig::default())
    }
}
