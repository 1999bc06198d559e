//! Subgraph extraction tests: bounds, edge consistency, neighborhoods.

mod common;

use std::collections::HashSet;

use glossgraph_engine::subgraph::{
    clamp_per_type_limit, graph_view, morpheme_neighborhood, word_neighborhood, GraphView,
    ViewOptions, MAX_PER_TYPE_LIMIT, MIN_PER_TYPE_LIMIT,
};
use glossgraph_engine::ingest_text;
use glossgraph_store::{GraphStore, NodeLabel};

fn sample_store() -> GraphStore {
    let mut store = GraphStore::new();
    ingest_text(&mut store, &common::sample_text()).unwrap();
    store
}

/// Every emitted edge endpoint must be a node of the view.
fn assert_edge_consistency(view: &GraphView) {
    let ids: HashSet<&str> = view.nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &view.edges {
        assert!(ids.contains(edge.source.as_str()), "dangling source {}", edge.source);
        assert!(ids.contains(edge.target.as_str()), "dangling target {}", edge.target);
    }
}

#[test]
fn per_type_limit_is_clamped() {
    assert_eq!(clamp_per_type_limit(5), MIN_PER_TYPE_LIMIT);
    assert_eq!(clamp_per_type_limit(5000), MAX_PER_TYPE_LIMIT);
    assert_eq!(clamp_per_type_limit(200), 200);
}

#[test]
fn text_anchored_view_covers_the_hierarchy() {
    let store = sample_store();
    let view = graph_view(
        &store,
        &ViewOptions {
            text_id: Some("t-1".to_string()),
            ..ViewOptions::default()
        },
    );

    assert!(view.message.is_none());
    assert_edge_consistency(&view);

    let types: HashSet<&str> = view.nodes.iter().map(|n| n.node_type.as_str()).collect();
    for expected in ["Text", "Section", "Phrase", "Word", "Morpheme"] {
        assert!(types.contains(expected), "missing {expected} nodes");
    }
    assert_eq!(view.stats.node_count, view.nodes.len());
    assert_eq!(view.stats.edge_count, view.edges.len());
}

#[test]
fn unknown_text_seed_yields_explicit_empty_view() {
    let store = sample_store();
    let view = graph_view(
        &store,
        &ViewOptions {
            text_id: Some("missing".to_string()),
            ..ViewOptions::default()
        },
    );
    assert!(view.nodes.is_empty());
    assert!(view.edges.is_empty());
    assert!(view.message.as_deref().unwrap_or("").contains("missing"));
}

#[test]
fn sampling_mode_respects_label_filter() {
    let store = sample_store();
    let view = graph_view(
        &store,
        &ViewOptions {
            labels: Some(vec![NodeLabel::Word, NodeLabel::Gloss]),
            ..ViewOptions::default()
        },
    );
    assert_edge_consistency(&view);
    assert!(view
        .nodes
        .iter()
        .all(|n| n.node_type == "Word" || n.node_type == "Gloss"));
    // Gloss→Word edges survive because both endpoints were sampled.
    assert!(view.edges.iter().any(|e| e.edge_type == "ANALYZES"));
}

#[test]
fn sampling_mode_filters_language_on_carrying_labels() {
    let store = sample_store();
    let view = graph_view(
        &store,
        &ViewOptions {
            labels: Some(vec![NodeLabel::Text]),
            language: Some("swh".to_string()),
            ..ViewOptions::default()
        },
    );
    assert_eq!(view.nodes.len(), 1);

    let none = graph_view(
        &store,
        &ViewOptions {
            labels: Some(vec![NodeLabel::Text]),
            language: Some("xx".to_string()),
            ..ViewOptions::default()
        },
    );
    assert!(none.nodes.is_empty());
}

#[test]
fn display_labels_prefer_type_specific_fields() {
    let store = sample_store();
    let view = graph_view(
        &store,
        &ViewOptions {
            text_id: Some("t-1".to_string()),
            ..ViewOptions::default()
        },
    );

    let text = view.nodes.iter().find(|n| n.node_type == "Text").unwrap();
    assert_eq!(text.label, "Hunting story");
    let word = view.nodes.iter().find(|n| n.id == "w-kitabu").unwrap();
    assert_eq!(word.label, "kitabu");
}

#[test]
fn word_neighborhood_includes_ancestry_morphology_and_siblings() {
    let store = sample_store();
    let view = word_neighborhood(&store, "kitabu", None);
    assert!(view.message.is_none());
    assert_edge_consistency(&view);

    let ids: HashSet<&str> = view.nodes.iter().map(|n| n.id.as_str()).collect();
    // Ancestry.
    for expected in ["t-1", "s-1", "p-1", "w-kitabu"] {
        assert!(ids.contains(expected), "missing {expected}");
    }
    // Own morphology with gloss annotations.
    assert!(ids.contains("m-ki") && ids.contains("m-tabu"));
    assert!(ids.contains("gloss-morph-m-tabu"));
    // Siblings through the shared `m-ki` prefix and `m-tabu` stem.
    assert!(ids.contains("w-kizuri"));
    assert!(ids.contains("w-vitabu"));
}

#[test]
fn word_neighborhood_missing_seed_is_empty_with_message() {
    let store = sample_store();
    let view = word_neighborhood(&store, "nonesuch", None);
    assert!(view.nodes.is_empty());
    assert!(view.message.as_deref().unwrap_or("").contains("nonesuch"));
}

#[test]
fn morpheme_neighborhood_collects_containing_words_and_context() {
    let store = sample_store();
    let view = morpheme_neighborhood(&store, "tabu", None);
    assert!(view.message.is_none());
    assert_edge_consistency(&view);

    let ids: HashSet<&str> = view.nodes.iter().map(|n| n.id.as_str()).collect();
    assert!(ids.contains("m-tabu"));
    assert!(ids.contains("gloss-morph-m-tabu"));
    assert!(ids.contains("w-kitabu") && ids.contains("w-vitabu"));
    // Context ancestry for containing words.
    assert!(ids.contains("p-1") && ids.contains("p-2"));
    assert!(ids.contains("t-1"));
}

#[test]
fn neighborhoods_report_no_dropped_edges_on_consistent_data() {
    let store = sample_store();
    let view = word_neighborhood(&store, "kitabu", None);
    assert_eq!(view.stats.dropped_edge_count, 0);
}
