//! Triple aggregation
//!
//! Walks a document's annotation entries and produces one [`Record`] per
//! merged sentence interval. Entity and interval state lives only for the
//! duration of one document; the relation registry spans the corpus.

use std::collections::HashMap;

use relset_core::{
    normalize, AnnotationEntry, Document, Entity, Interval, Record, RelationRegistry,
    RelsetError, Result, Triple,
};

use crate::interval::IntervalMerger;
use crate::sentence::{substring, DelimiterBoundaryFinder, SentenceBoundaryFinder};

// ============================================================================
// Aggregation result
// ============================================================================

/// Output of aggregating many documents
#[derive(Debug, Default)]
pub struct Aggregation {
    /// Records of all successful documents, in document order
    pub records: Vec<Record>,
    /// Labels of all successful documents, in first-seen order
    pub registry: RelationRegistry,
    /// One error per rejected document
    pub failures: Vec<RelsetError>,
}

impl Aggregation {
    /// Total number of triples across all records
    pub fn triple_count(&self) -> usize {
        self.records.iter().map(|r| r.triple_list.len()).sum()
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Builds sentence-level records from annotated documents
#[derive(Debug, Default)]
pub struct TripleAggregator<F = DelimiterBoundaryFinder> {
    finder: F,
}

impl TripleAggregator {
    /// Create an aggregator splitting sentences on `.`
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: SentenceBoundaryFinder> TripleAggregator<F> {
    pub fn with_finder(finder: F) -> Self {
        Self { finder }
    }

    /// Aggregate one document.
    ///
    /// The registry only receives the document's labels if the whole
    /// document succeeds.
    pub fn aggregate(
        &self,
        document: &Document,
        registry: &mut RelationRegistry,
    ) -> Result<Vec<Record>> {
        let chars: Vec<char> = document.text.chars().collect();
        let entities = collect_entities(document, chars.len())?;

        let mut merger = IntervalMerger::new();
        let mut labels_seen: Vec<&str> = Vec::new();

        for (index, entry) in document.entries.iter().enumerate() {
            let AnnotationEntry::Relation {
                from_id,
                to_id,
                labels,
            } = entry
            else {
                continue;
            };

            let malformed = |reason: String| RelsetError::malformed(&document.id, index, reason);
            let from_id = from_id
                .as_deref()
                .ok_or_else(|| malformed("relation without from_id".to_string()))?;
            let to_id = to_id
                .as_deref()
                .ok_or_else(|| malformed("relation without to_id".to_string()))?;
            let labels = labels
                .as_ref()
                .ok_or_else(|| malformed("relation without labels".to_string()))?;

            let from = entities
                .get(from_id)
                .ok_or_else(|| malformed(format!("unknown entity id {from_id}")))?;
            let to = entities
                .get(to_id)
                .ok_or_else(|| malformed(format!("unknown entity id {to_id}")))?;

            let begin = from.start.min(to.start);
            let end = from.stop.max(to.stop);
            let sentence = self.finder.resolve(&chars, begin, end);
            let placement = merger.place(sentence);

            tracing::trace!(
                "{}: relation {} -> {} at {} placed in {} as {:?}",
                document.id,
                from.id,
                to.id,
                sentence,
                placement.interval,
                placement.kind
            );

            let subject = normalize(&from.name);
            let object = normalize(&to.name);
            for label in labels {
                if !labels_seen.contains(&label.as_str()) {
                    labels_seen.push(label);
                }
                merger.push(
                    placement.slot,
                    Triple::new(subject.clone(), label.clone(), object.clone()),
                );
            }
        }

        for label in labels_seen {
            registry.register(label);
        }

        let records: Vec<Record> = merger
            .into_entries()
            .into_iter()
            .map(|(interval, triples)| freeze(&chars, interval, triples))
            .collect();

        tracing::debug!(
            "{}: {} record(s), {} triple(s)",
            document.id,
            records.len(),
            records.iter().map(|r| r.triple_list.len()).sum::<usize>()
        );
        Ok(records)
    }

    /// Aggregate documents in order into `registry`, isolating failures
    pub fn aggregate_into(
        &self,
        documents: &[Document],
        registry: &mut RelationRegistry,
    ) -> (Vec<Record>, Vec<RelsetError>) {
        let mut records = Vec::new();
        let mut failures = Vec::new();

        for document in documents {
            match self.aggregate(document, registry) {
                Ok(doc_records) => records.extend(doc_records),
                Err(e) => {
                    tracing::warn!("Skipping document: {}", e);
                    failures.push(e);
                }
            }
        }

        (records, failures)
    }

    /// Aggregate documents in order with a fresh registry
    pub fn aggregate_corpus(&self, documents: &[Document]) -> Aggregation {
        let mut registry = RelationRegistry::new();
        let (records, failures) = self.aggregate_into(documents, &mut registry);
        Aggregation {
            records,
            registry,
            failures,
        }
    }
}

/// Build the id -> entity table from every `labels` entry
fn collect_entities(document: &Document, text_len: usize) -> Result<HashMap<&str, Entity>> {
    let mut entities = HashMap::new();

    for (index, entry) in document.entries.iter().enumerate() {
        let AnnotationEntry::Label { id, value } = entry else {
            continue;
        };
        let malformed = |reason: &str| RelsetError::malformed(&document.id, index, reason);

        let id = id.as_deref().ok_or_else(|| malformed("label without id"))?;
        let value = value.as_ref().ok_or_else(|| malformed("label without value"))?;
        let name = value
            .text
            .as_ref()
            .ok_or_else(|| malformed("label without value.text"))?;
        let start = value
            .start
            .ok_or_else(|| malformed("label without value.start"))?;
        let stop = value.end.ok_or_else(|| malformed("label without value.end"))?;

        if start >= text_len || stop > text_len {
            return Err(RelsetError::malformed(
                &document.id,
                index,
                format!("span {start}..{stop} outside text of length {text_len}"),
            ));
        }

        entities.insert(
            id,
            Entity {
                id: id.to_string(),
                name: name.clone(),
                start,
                stop,
            },
        );
    }

    Ok(entities)
}

fn freeze(chars: &[char], interval: Interval, triples: Vec<Triple>) -> Record {
    Record::new(normalize(&substring(chars, interval)), triples)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use relset_core::LabelValue;

    /// Label entry located by the first occurrence of `name` in `text`
    fn label(text: &str, id: &str, name: &str) -> AnnotationEntry {
        let byte = text.find(name).unwrap();
        let start = text[..byte].chars().count();
        let stop = start + name.chars().count() - 1;
        AnnotationEntry::label(id, name, start, stop)
    }

    fn doc(text: &str, entries: Vec<AnnotationEntry>) -> Document {
        Document::new("doc", text).with_entries(entries)
    }

    #[test]
    fn test_single_relation() {
        let text = "Intro. Alice works at Acme. Outro.";
        let document = doc(
            text,
            vec![
                label(text, "a", "Alice"),
                label(text, "b", "Acme"),
                AnnotationEntry::relation("a", "b", &["worksAt"]),
            ],
        );

        let mut registry = RelationRegistry::new();
        let records = TripleAggregator::new()
            .aggregate(&document, &mut registry)
            .unwrap();

        assert_eq!(
            records,
            vec![Record::new(
                "Alice works at Acme.",
                vec![Triple::new("Alice", "worksAt", "Acme")]
            )]
        );
        assert_eq!(registry.id("worksAt"), Some(0));
    }

    #[test]
    fn test_same_sentence_relations_share_record() {
        let text = "Alice works at Acme in Vienna. Bob is idle.";
        let document = doc(
            text,
            vec![
                label(text, "a", "Alice"),
                label(text, "b", "Acme"),
                label(text, "c", "Vienna"),
                AnnotationEntry::relation("a", "b", &["worksAt"]),
                AnnotationEntry::relation("b", "c", &["locatedIn"]),
            ],
        );

        let records = TripleAggregator::new()
            .aggregate(&document, &mut RelationRegistry::new())
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "Alice works at Acme in Vienna.");
        assert_eq!(
            records[0].triple_list,
            vec![
                Triple::new("Alice", "worksAt", "Acme"),
                Triple::new("Acme", "locatedIn", "Vienna"),
            ]
        );
    }

    #[test]
    fn test_cross_sentence_relation_merges_records() {
        let text = "Alice founded Acme. Later Bob joined. Acme hired Carol.";
        let document = doc(
            text,
            vec![
                label(text, "a", "Alice"),
                label(text, "b", "Acme"),
                label(text, "c", "Bob"),
                label(text, "d", "Carol"),
                AnnotationEntry::relation("a", "b", &["founded"]),
                AnnotationEntry::relation("c", "d", &["knows"]),
            ],
        );

        let records = TripleAggregator::new()
            .aggregate(&document, &mut RelationRegistry::new())
            .unwrap();

        // "Bob ... Carol" spans the last two sentences, disjoint from the first
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].text, "Later Bob joined. Acme hired Carol.");

        let cross = doc(
            text,
            vec![
                label(text, "a", "Alice"),
                label(text, "b", "Acme"),
                label(text, "c", "Bob"),
                AnnotationEntry::relation("a", "b", &["founded"]),
                AnnotationEntry::relation("a", "c", &["mentors"]),
            ],
        );
        let records = TripleAggregator::new()
            .aggregate(&cross, &mut RelationRegistry::new())
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "Alice founded Acme. Later Bob joined.");
        assert_eq!(records[0].triple_list.len(), 2);
    }

    #[test]
    fn test_multiple_labels_on_one_relation() {
        let text = "Alice leads Acme.";
        let document = doc(
            text,
            vec![
                label(text, "a", "Alice"),
                label(text, "b", "Acme"),
                AnnotationEntry::relation("a", "b", &["worksAt", "manages"]),
            ],
        );

        let mut registry = RelationRegistry::new();
        let records = TripleAggregator::new()
            .aggregate(&document, &mut registry)
            .unwrap();

        assert_eq!(records[0].triple_list.len(), 2);
        assert_eq!(records[0].triple_list[1].predicate, "manages");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_entity_names_and_text_are_normalized() {
        let text = "Jürgen works at Café Zürich.";
        let document = doc(
            text,
            vec![
                label(text, "a", "Jürgen"),
                label(text, "b", "Café Zürich"),
                AnnotationEntry::relation("a", "b", &["worksAt"]),
            ],
        );

        let records = TripleAggregator::new()
            .aggregate(&document, &mut RelationRegistry::new())
            .unwrap();

        assert_eq!(records[0].text, "Jurgen works at Cafe Zurich.");
        assert_eq!(
            records[0].triple_list[0],
            Triple::new("Jurgen", "worksAt", "Cafe Zurich")
        );
    }

    #[test]
    fn test_relation_with_empty_labels_keeps_record() {
        let text = "Alice met Bob.";
        let document = doc(
            text,
            vec![
                label(text, "a", "Alice"),
                label(text, "b", "Bob"),
                AnnotationEntry::relation("a", "b", &[]),
            ],
        );

        let records = TripleAggregator::new()
            .aggregate(&document, &mut RelationRegistry::new())
            .unwrap();

        assert_eq!(records.len(), 1);
        assert!(records[0].triple_list.is_empty());
    }

    #[test]
    fn test_relation_before_label_entry_resolves() {
        let text = "Alice met Bob.";
        let document = doc(
            text,
            vec![
                AnnotationEntry::relation("a", "b", &["knows"]),
                label(text, "a", "Alice"),
                label(text, "b", "Bob"),
            ],
        );

        let records = TripleAggregator::new()
            .aggregate(&document, &mut RelationRegistry::new())
            .unwrap();
        assert_eq!(records[0].triple_list[0].subject, "Alice");
    }

    #[test]
    fn test_dangling_entity_is_malformed() {
        let text = "Alice met Bob.";
        let document = doc(
            text,
            vec![
                label(text, "a", "Alice"),
                AnnotationEntry::relation("a", "missing", &["knows"]),
            ],
        );

        let mut registry = RelationRegistry::new();
        let err = TripleAggregator::new()
            .aggregate(&document, &mut registry)
            .unwrap_err();

        match err {
            RelsetError::MalformedAnnotation {
                document, entry, ..
            } => {
                assert_eq!(document, "doc");
                assert_eq!(entry, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let text = "Alice met Bob.";
        let missing_labels = doc(
            text,
            vec![
                label(text, "a", "Alice"),
                label(text, "b", "Bob"),
                AnnotationEntry::Relation {
                    from_id: Some("a".to_string()),
                    to_id: Some("b".to_string()),
                    labels: None,
                },
            ],
        );
        let missing_start = doc(
            text,
            vec![AnnotationEntry::Label {
                id: Some("a".to_string()),
                value: Some(LabelValue {
                    text: Some("Alice".to_string()),
                    start: None,
                    end: Some(4),
                }),
            }],
        );
        let out_of_range = doc(text, vec![AnnotationEntry::label("a", "Alice", 40, 44)]);

        let aggregator = TripleAggregator::new();
        for document in [missing_labels, missing_start, out_of_range] {
            let result = aggregator.aggregate(&document, &mut RelationRegistry::new());
            assert!(matches!(
                result,
                Err(RelsetError::MalformedAnnotation { .. })
            ));
        }
    }

    #[test]
    fn test_aggregate_corpus_isolates_failures() {
        let good = "Alice works at Acme.";
        let documents = vec![
            doc(
                good,
                vec![
                    label(good, "a", "Alice"),
                    label(good, "b", "Acme"),
                    AnnotationEntry::relation("a", "b", &["worksAt"]),
                ],
            ),
            doc(good, vec![AnnotationEntry::relation("x", "y", &["broken"])]),
            doc(
                good,
                vec![
                    label(good, "a", "Alice"),
                    label(good, "b", "Acme"),
                    AnnotationEntry::relation("b", "a", &["employs"]),
                ],
            ),
        ];

        let aggregation = TripleAggregator::new().aggregate_corpus(&documents);

        assert_eq!(aggregation.records.len(), 2);
        assert_eq!(aggregation.failures.len(), 1);
        assert_eq!(aggregation.registry.id("worksAt"), Some(0));
        assert_eq!(aggregation.registry.id("employs"), Some(1));
        assert_eq!(aggregation.registry.id("broken"), None);
        assert_eq!(aggregation.triple_count(), 2);
    }

    #[test]
    fn test_relations_on_trailing_delimiter_share_one_record() {
        let text = "Done.";
        let document = doc(
            text,
            vec![
                AnnotationEntry::label("x", ".", 4, 4),
                AnnotationEntry::label("y", ".", 4, 4),
                AnnotationEntry::relation("x", "y", &["a"]),
                AnnotationEntry::relation("y", "x", &["b"]),
            ],
        );

        let records = TripleAggregator::new()
            .aggregate(&document, &mut RelationRegistry::new())
            .unwrap();

        assert_eq!(
            records,
            vec![Record::new(
                "",
                vec![Triple::new(".", "a", "."), Triple::new(".", "b", ".")]
            )]
        );
    }

    struct WholeText;

    impl SentenceBoundaryFinder for WholeText {
        fn resolve(&self, chars: &[char], _begin_pos: usize, _end_pos: usize) -> Interval {
            Interval::new(0, chars.len().saturating_sub(1))
        }
    }

    #[test]
    fn test_custom_finder_controls_sentence_scope() {
        let text = "Alice works at Acme. Bob works at Initech.";
        let document = doc(
            text,
            vec![
                label(text, "a", "Alice"),
                label(text, "b", "Acme"),
                label(text, "c", "Bob"),
                label(text, "d", "Initech"),
                AnnotationEntry::relation("a", "b", &["worksAt"]),
                AnnotationEntry::relation("c", "d", &["worksAt"]),
            ],
        );

        let by_sentence = TripleAggregator::new()
            .aggregate(&document, &mut RelationRegistry::new())
            .unwrap();
        assert_eq!(by_sentence.len(), 2);

        let whole = TripleAggregator::with_finder(WholeText)
            .aggregate(&document, &mut RelationRegistry::new())
            .unwrap();
        assert_eq!(whole.len(), 1);
        assert_eq!(whole[0].text, text);
        assert_eq!(whole[0].triple_list.len(), 2);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let text = "Alice works at Acme. Acme is in Vienna. Bob lives in Graz.";
        let documents = vec![doc(
            text,
            vec![
                label(text, "a", "Alice"),
                label(text, "b", "Acme"),
                label(text, "c", "Vienna"),
                label(text, "d", "Bob"),
                label(text, "e", "Graz"),
                AnnotationEntry::relation("d", "e", &["livesIn"]),
                AnnotationEntry::relation("a", "b", &["worksAt"]),
                AnnotationEntry::relation("a", "c", &["near"]),
            ],
        )];

        let aggregator = TripleAggregator::new();
        let first = aggregator.aggregate_corpus(&documents);
        let second = aggregator.aggregate_corpus(&documents);

        assert_eq!(first.records, second.records);
        assert_eq!(first.registry, second.registry);
        assert_eq!(
            serde_json::to_string(&first.records).unwrap(),
            serde_json::to_string(&second.records).unwrap()
        );
    }
}
