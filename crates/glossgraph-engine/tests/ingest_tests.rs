//! Persistence engine tests: idempotence, dedup policy, gloss synthesis.

mod common;

use glossgraph_engine::{ingest_text, EngineError};
use glossgraph_model::{InterlinearText, Section};
use glossgraph_store::{GraphStore, NodeLabel};

#[test]
fn ingesting_twice_changes_nothing() {
    let mut store = GraphStore::new();
    let doc = common::sample_text();

    let first = ingest_text(&mut store, &doc).unwrap();
    assert!(first.was_created);
    let after_first = (store.node_count(), store.edge_count());

    let second = ingest_text(&mut store, &doc).unwrap();
    assert!(!second.was_created);
    assert_eq!((store.node_count(), store.edge_count()), after_first);
}

#[test]
fn counters_reflect_created_nodes() {
    let mut store = GraphStore::new();
    let outcome = ingest_text(&mut store, &common::sample_text()).unwrap();

    assert_eq!(outcome.counters.sections, 1);
    assert_eq!(outcome.counters.phrases, 2);
    assert_eq!(outcome.counters.words, 4);
    // `m-ki` and `m-tabu` are shared, so four distinct morphemes.
    assert_eq!(outcome.counters.morphemes, 4);
    // Three word glosses (punctuation has none) + four morpheme glosses.
    assert_eq!(outcome.counters.glosses, 7);

    assert_eq!(store.label_count(NodeLabel::Word), 4);
    assert_eq!(store.label_count(NodeLabel::Morpheme), 4);
    assert_eq!(store.label_count(NodeLabel::Gloss), 7);
}

#[test]
fn re_ingest_refreshes_metadata_but_skips_structure() {
    let mut store = GraphStore::new();
    ingest_text(&mut store, &common::sample_text()).unwrap();

    // Same id, new title, and a brand-new section that must be ignored.
    let mut altered = common::sample_text();
    altered.title = Some("Revised title".to_string());
    altered.sections.push(Section {
        id: "s-new".to_string(),
        order: 9,
        phrases: vec![],
        words: vec![],
    });

    let outcome = ingest_text(&mut store, &altered).unwrap();
    assert!(!outcome.was_created);
    assert_eq!(outcome.counters.sections, 0);

    let text = store.node_by_id(NodeLabel::Text, "t-1").unwrap();
    assert_eq!(store.prop(text, "title").as_deref(), Some("Revised title"));
    assert_eq!(store.node_by_id(NodeLabel::Section, "s-new"), None);
    assert_eq!(store.label_count(NodeLabel::Section), 1);
}

#[test]
fn gloss_nodes_are_deduplicated_by_derived_id() {
    let mut store = GraphStore::new();
    ingest_text(&mut store, &common::sample_text()).unwrap();

    let gloss = store
        .node_by_id(NodeLabel::Gloss, "gloss-word-w-kitabu")
        .expect("word gloss synthesized");
    assert_eq!(store.prop(gloss, "annotation").as_deref(), Some("book"));
    assert_eq!(store.prop(gloss, "gloss_type").as_deref(), Some("word"));

    assert!(store
        .node_by_id(NodeLabel::Gloss, "gloss-morph-m-tabu")
        .is_some());
    // Punctuation carries no gloss, so no node was derived for it.
    assert!(store
        .node_by_id(NodeLabel::Gloss, "gloss-word-w-stop")
        .is_none());
}

#[test]
fn shared_morpheme_is_written_once_with_both_edges() {
    let mut store = GraphStore::new();
    ingest_text(&mut store, &common::sample_text()).unwrap();

    let shared = store.node_by_id(NodeLabel::Morpheme, "m-ki").unwrap();
    let containing = store.sources(shared, glossgraph_store::EdgeKind::MadeOf);
    assert_eq!(containing.len(), 2);
}

#[test]
fn invalid_document_leaves_store_untouched() {
    let mut store = GraphStore::new();
    let doc = InterlinearText {
        id: String::new(),
        title: None,
        source: None,
        comment: None,
        language: None,
        sections: vec![],
    };

    let err = ingest_text(&mut store, &doc).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(store.node_count(), 0);
}

#[test]
fn word_order_is_recorded_on_composition_edges() {
    let mut store = GraphStore::new();
    ingest_text(&mut store, &common::five_word_text()).unwrap();

    let phrase = store.node_by_id(NodeLabel::Phrase, "p-kwic").unwrap();
    let mut orders: Vec<(i64, String)> = store
        .outgoing(phrase, glossgraph_store::EdgeKind::ComposedOf)
        .iter()
        .map(|&e| {
            let edge = store.edge(e).unwrap();
            (edge.order.unwrap(), store.external_id(edge.target).unwrap())
        })
        .collect();
    orders.sort();

    let ids: Vec<&str> = orders.iter().map(|(_, id)| id.as_str()).collect();
    assert_eq!(ids, ["w-A", "w-B", "w-C", "w-D", "w-E"]);
}
