//! GraphStore E2E tests: merge semantics, timestamps, queries, snapshots.

use glossgraph_store::{EdgeKind, GraphStore, NodeLabel};

#[test]
fn created_at_is_set_once_updated_at_refreshes() {
    let mut store = GraphStore::new();
    let node = store
        .merge_node(NodeLabel::Text, "t-1", &[("title", Some("First"))])
        .node;
    let created = store.created_at(node).unwrap();

    std::thread::sleep(std::time::Duration::from_millis(5));
    store.merge_node(NodeLabel::Text, "t-1", &[("title", Some("Second"))]);

    assert_eq!(store.created_at(node), Some(created));
    assert!(store.updated_at(node).unwrap() > created);
}

#[test]
fn props_can_be_cleared_with_none() {
    let mut store = GraphStore::new();
    let node = store
        .merge_node(NodeLabel::Text, "t-1", &[("comment", Some("keep me"))])
        .node;
    assert_eq!(store.prop(node, "comment").as_deref(), Some("keep me"));

    store.merge_node(NodeLabel::Text, "t-1", &[("comment", None)]);
    assert_eq!(store.prop(node, "comment"), None);
}

#[test]
fn label_index_and_lookup() {
    let mut store = GraphStore::new();
    store.merge_node(NodeLabel::Word, "w-1", &[("surface_form", Some("kitabu"))]);
    store.merge_node(NodeLabel::Word, "w-2", &[("surface_form", Some("vitabu"))]);
    store.merge_node(NodeLabel::Morpheme, "m-1", &[("surface_form", Some("ki"))]);

    assert_eq!(store.label_count(NodeLabel::Word), 2);
    assert_eq!(store.label_count(NodeLabel::Morpheme), 1);
    assert_eq!(store.label_count(NodeLabel::Gloss), 0);

    let w1 = store.node_by_id(NodeLabel::Word, "w-1").unwrap();
    assert_eq!(store.external_id(w1).as_deref(), Some("w-1"));
    assert_eq!(store.label_of(w1), Some(NodeLabel::Word));
    assert_eq!(store.node_by_id(NodeLabel::Word, "missing"), None);
}

#[test]
fn substring_search_is_case_sensitive() {
    let mut store = GraphStore::new();
    store.merge_node(NodeLabel::Word, "w-1", &[("gloss", Some("book.PL"))]);
    store.merge_node(NodeLabel::Word, "w-2", &[("gloss", Some("book.pl"))]);

    let upper = store.nodes_with_prop_containing(NodeLabel::Word, &["gloss"], "PL");
    assert_eq!(upper.len(), 1);

    let lower = store.nodes_with_prop_containing(NodeLabel::Word, &["gloss"], "pl");
    assert_eq!(lower.len(), 1);

    let both = store.nodes_with_prop_containing(NodeLabel::Word, &["gloss"], "book");
    assert_eq!(both.len(), 2);

    // An empty needle matches nothing rather than everything.
    let none = store.nodes_with_prop_containing(NodeLabel::Word, &["gloss"], "");
    assert!(none.is_empty());
}

#[test]
fn multi_key_search_dedupes_nodes() {
    let mut store = GraphStore::new();
    store.merge_node(
        NodeLabel::Morpheme,
        "m-1",
        &[("surface_form", Some("ki")), ("citation_form", Some("ki"))],
    );

    let hits = store.nodes_with_prop_containing(
        NodeLabel::Morpheme,
        &["surface_form", "citation_form"],
        "ki",
    );
    assert_eq!(hits.len(), 1);
}

#[test]
fn adjacency_queries() {
    let mut store = GraphStore::new();
    let t = store.merge_node(NodeLabel::Text, "t-1", &[]).node;
    let s = store.merge_node(NodeLabel::Section, "s-1", &[]).node;
    let p = store.merge_node(NodeLabel::Phrase, "p-1", &[]).node;
    let w = store.merge_node(NodeLabel::Word, "w-1", &[]).node;

    store.merge_edge(t, EdgeKind::Has, s, None).unwrap();
    store.merge_edge(s, EdgeKind::Has, p, None).unwrap();
    store.merge_edge(p, EdgeKind::ComposedOf, w, Some(0)).unwrap();

    assert!(store.targets(t, EdgeKind::Has).contains(s));
    assert!(store.sources(p, EdgeKind::Has).contains(s));
    assert_eq!(store.outgoing(p, EdgeKind::ComposedOf).len(), 1);
    assert!(store.incoming(w, EdgeKind::ComposedOf).len() == 1);

    let edge_id = store.outgoing(p, EdgeKind::ComposedOf)[0];
    let edge = store.edge(edge_id).unwrap();
    assert_eq!(edge.order, Some(0));
}

#[test]
fn snapshot_round_trip() {
    let mut store = GraphStore::new();
    let t = store
        .merge_node(NodeLabel::Text, "t-1", &[("title", Some("Hunting story"))])
        .node;
    let s = store.merge_node(NodeLabel::Section, "s-1", &[("order", Some("0"))]).node;
    store.merge_edge(t, EdgeKind::Has, s, None).unwrap();

    let bytes = store.to_bytes().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.glsg");
    std::fs::write(&path, &bytes).unwrap();

    let restored = GraphStore::from_bytes(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(restored.node_count(), 2);
    assert_eq!(restored.edge_count(), 1);

    let t2 = restored.node_by_id(NodeLabel::Text, "t-1").unwrap();
    assert_eq!(restored.prop(t2, "title").as_deref(), Some("Hunting story"));
    assert_eq!(restored.created_at(t2), store.created_at(t));

    // Merging into the restored store must still dedupe.
    let mut restored = restored;
    let again = restored.merge_node(NodeLabel::Text, "t-1", &[]);
    assert!(!again.created);
}

#[test]
fn from_bytes_rejects_garbage() {
    assert!(GraphStore::from_bytes(b"not a snapshot").is_err());
    assert!(GraphStore::from_bytes(b"GLSG\x09\x00\x00\x00").is_err());
}

#[test]
fn wipe_reports_and_clears() {
    let mut store = GraphStore::new();
    let t = store.merge_node(NodeLabel::Text, "t-1", &[]).node;
    let s = store.merge_node(NodeLabel::Section, "s-1", &[]).node;
    store.merge_edge(t, EdgeKind::Has, s, None).unwrap();

    let deleted = store.wipe();
    assert_eq!(deleted.texts, 1);
    assert_eq!(deleted.sections, 1);
    assert_eq!(deleted.relationships, 1);
    assert_eq!(store.node_count(), 0);
    assert_eq!(store.edge_count(), 0);
    assert_eq!(store.node_by_id(NodeLabel::Text, "t-1"), None);
}
