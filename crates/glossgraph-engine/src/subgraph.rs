//! Bounded subgraph extraction for exploration.
//!
//! Produces a renderable node/edge sample, never an exhaustive dump. All
//! bounds exist to cap worst-case compute and payload per request:
//!
//! - `per_type_limit` is clamped into `[10, 1000]` regardless of what the
//!   caller asked for;
//! - text-anchored traversal stops at a fixed hierarchy depth and a fixed
//!   node ceiling;
//! - entity-anchored neighborhoods cap related entities at a small constant.
//!
//! Edges are emitted only among collected nodes. Candidate edges whose
//! endpoint fell outside the final node set are discarded by policy: a
//! documented data-shaping decision, reported via `dropped_edge_count` and a
//! warning, never an error.

use std::collections::{BTreeMap, HashSet, VecDeque};

use glossgraph_store::{EdgeKind, GraphStore, NodeLabel};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

pub const MIN_PER_TYPE_LIMIT: usize = 10;
pub const MAX_PER_TYPE_LIMIT: usize = 1000;
pub const DEFAULT_PER_TYPE_LIMIT: usize = 200;

/// Hierarchy hops covered from a text seed, enough to reach morphemes at the
/// bottom of the deepest chain Text→Section→Phrase→Word→Morpheme.
const TEXT_TRAVERSAL_DEPTH: usize = 4;
/// Node ceiling multiplier for text-anchored traversal.
const TEXT_NODE_FACTOR: usize = 5;
/// Cap on structurally related entities in neighborhood views.
const RELATED_ENTITY_CAP: usize = 10;
/// How many containing words get full ancestry in a morpheme neighborhood.
const CONTEXT_WORD_CAP: usize = 5;

pub fn clamp_per_type_limit(requested: usize) -> usize {
    requested.clamp(MIN_PER_TYPE_LIMIT, MAX_PER_TYPE_LIMIT)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    /// Anchor the view on one text; absent means sampling mode.
    pub text_id: Option<String>,
    pub language: Option<String>,
    /// Restrict sampling to these labels; absent means all.
    pub labels: Option<Vec<NodeLabel>>,
    pub per_type_limit: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            text_id: None,
            language: None,
            labels: None,
            per_type_limit: DEFAULT_PER_TYPE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewNode {
    /// External (stable) id.
    pub id: String,
    /// Display label derived from type-preferred properties.
    pub label: String,
    pub node_type: String,
    pub props: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub edge_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub dropped_edge_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<ViewEdge>,
    pub stats: ViewStats,
    /// Present on explicit empty results (e.g. unknown seed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GraphView {
    fn empty(message: impl Into<String>) -> Self {
        GraphView {
            nodes: Vec::new(),
            edges: Vec::new(),
            stats: ViewStats::default(),
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Text-anchored and sampling extraction
// ============================================================================

pub fn graph_view(store: &GraphStore, options: &ViewOptions) -> GraphView {
    let limit = clamp_per_type_limit(options.per_type_limit);

    match options.text_id.as_deref() {
        Some(text_id) => {
            let Some(seed) = store.node_by_id(NodeLabel::Text, text_id) else {
                return GraphView::empty(format!("Text `{text_id}` not found"));
            };
            let selected = collect_from_text(store, seed, limit * TEXT_NODE_FACTOR);
            let edges = edges_within(store, &selected_set(&selected));
            finalize(store, selected, edges, None)
        }
        None => {
            let selected = sample_nodes(store, options, limit);
            let edges = edges_within(store, &selected_set(&selected));
            finalize(store, selected, edges, None)
        }
    }
}

/// Outward breadth-first traversal over ownership edges, bounded by depth and
/// node ceiling. Gloss annotations attach via *incoming* edges and are not
/// part of the outward walk; sampling mode or the neighborhood views surface
/// them.
fn collect_from_text(store: &GraphStore, seed: u32, max_nodes: usize) -> Vec<u32> {
    let mut selected = Vec::new();
    let mut visited: HashSet<u32> = HashSet::new();
    let mut queue: VecDeque<(u32, usize)> = VecDeque::new();
    queue.push_back((seed, 0));
    visited.insert(seed);

    while let Some((node, depth)) = queue.pop_front() {
        if selected.len() >= max_nodes {
            tracing::warn!(max_nodes, "text traversal truncated at node ceiling");
            break;
        }
        selected.push(node);

        if depth >= TEXT_TRAVERSAL_DEPTH {
            continue;
        }
        for kind in [EdgeKind::Has, EdgeKind::ComposedOf, EdgeKind::MadeOf] {
            for target in store.targets(node, kind).iter() {
                if visited.insert(target) {
                    queue.push_back((target, depth + 1));
                }
            }
        }
    }

    selected
}

/// Sampling mode: up to `limit` nodes per allowed label, language-filtered
/// where the label carries a language (Text, Word, Morpheme).
fn sample_nodes(store: &GraphStore, options: &ViewOptions, limit: usize) -> Vec<u32> {
    let mut selected = Vec::new();
    for label in NodeLabel::ALL {
        if let Some(allowed) = &options.labels {
            if !allowed.contains(&label) {
                continue;
            }
        }

        let mut members = store.nodes_with_label(label);
        if let Some(language) = options.language.as_deref() {
            if matches!(label, NodeLabel::Text | NodeLabel::Word | NodeLabel::Morpheme) {
                members &= store.nodes_with_prop_eq(label, "language", language);
            }
        }
        selected.extend(members.iter().take(limit));
    }
    selected
}

fn selected_set(selected: &[u32]) -> HashSet<u32> {
    selected.iter().copied().collect()
}

/// Edges with both endpoints inside the node set. Edges crossing the
/// traversal horizon simply do not appear; that loss is by design.
fn edges_within(store: &GraphStore, selected: &HashSet<u32>) -> Vec<(u32, u32, EdgeKind)> {
    store
        .edges()
        .filter(|(_, e)| selected.contains(&e.source) && selected.contains(&e.target))
        .map(|(_, e)| (e.source, e.target, e.kind))
        .collect()
}

// ============================================================================
// Entity-anchored neighborhoods
// ============================================================================

/// Morphological neighborhood of one word: its ancestry, its morphemes and
/// their glosses, and words sharing a morpheme with it.
pub fn word_neighborhood(
    store: &GraphStore,
    surface_form: &str,
    language: Option<&str>,
) -> GraphView {
    let Some(word) = find_by_prop(store, NodeLabel::Word, "surface_form", surface_form, language)
    else {
        return GraphView::empty(format!("Word `{surface_form}` not found"));
    };

    let mut selected: Vec<u32> = Vec::new();
    let mut candidate_edges: Vec<(u32, u32, EdgeKind)> = Vec::new();

    push_unique(&mut selected, word);
    collect_ancestry(store, word, &mut selected, &mut candidate_edges);

    // The word's morphology, with gloss annotations.
    for morpheme in store.targets(word, EdgeKind::MadeOf).iter() {
        push_unique(&mut selected, morpheme);
        candidate_edges.push((word, morpheme, EdgeKind::MadeOf));
        for gloss in store.sources(morpheme, EdgeKind::Analyzes).iter() {
            push_unique(&mut selected, gloss);
            candidate_edges.push((gloss, morpheme, EdgeKind::Analyzes));
        }
    }

    // Same-morpheme siblings, capped.
    let mut related = 0usize;
    'outer: for morpheme in store.targets(word, EdgeKind::MadeOf).iter() {
        for sibling in store.sources(morpheme, EdgeKind::MadeOf).iter() {
            if sibling == word {
                continue;
            }
            if related >= RELATED_ENTITY_CAP {
                break 'outer;
            }
            related += 1;
            push_unique(&mut selected, sibling);
            candidate_edges.push((sibling, morpheme, EdgeKind::MadeOf));
            for sib_morpheme in store.targets(sibling, EdgeKind::MadeOf).iter() {
                push_unique(&mut selected, sib_morpheme);
                candidate_edges.push((sibling, sib_morpheme, EdgeKind::MadeOf));
                for gloss in store.sources(sib_morpheme, EdgeKind::Analyzes).iter() {
                    push_unique(&mut selected, gloss);
                    candidate_edges.push((gloss, sib_morpheme, EdgeKind::Analyzes));
                }
            }
        }
    }

    finalize(store, selected, candidate_edges, None)
}

/// Neighborhood of one morpheme: its glosses, the words containing it
/// (capped), and ancestry context for the first few of those words.
pub fn morpheme_neighborhood(store: &GraphStore, form: &str, language: Option<&str>) -> GraphView {
    let morpheme = find_by_prop(store, NodeLabel::Morpheme, "surface_form", form, language)
        .or_else(|| find_by_prop(store, NodeLabel::Morpheme, "citation_form", form, language));
    let Some(morpheme) = morpheme else {
        return GraphView::empty(format!("Morpheme `{form}` not found"));
    };

    let mut selected: Vec<u32> = Vec::new();
    let mut candidate_edges: Vec<(u32, u32, EdgeKind)> = Vec::new();

    push_unique(&mut selected, morpheme);
    for gloss in store.sources(morpheme, EdgeKind::Analyzes).iter() {
        push_unique(&mut selected, gloss);
        candidate_edges.push((gloss, morpheme, EdgeKind::Analyzes));
    }

    let containing: Vec<u32> = store
        .sources(morpheme, EdgeKind::MadeOf)
        .iter()
        .take(RELATED_ENTITY_CAP)
        .collect();
    for &word in &containing {
        push_unique(&mut selected, word);
        candidate_edges.push((word, morpheme, EdgeKind::MadeOf));
    }
    for &word in containing.iter().take(CONTEXT_WORD_CAP) {
        collect_ancestry(store, word, &mut selected, &mut candidate_edges);
    }

    finalize(store, selected, candidate_edges, None)
}

/// Walk Word ← Phrase ← Section ← Text, adding nodes and hierarchy edges.
fn collect_ancestry(
    store: &GraphStore,
    word: u32,
    selected: &mut Vec<u32>,
    edges: &mut Vec<(u32, u32, EdgeKind)>,
) {

    let Some(phrase) = store.sources(word, EdgeKind::ComposedOf).iter().next() else {
        return;
    };
    push_unique(selected, phrase);
    edges.push((phrase, word, EdgeKind::ComposedOf));

    let Some(section) = store.sources(phrase, EdgeKind::Has).iter().next() else {
        return;
    };
    push_unique(selected, section);
    edges.push((section, phrase, EdgeKind::Has));

    if let Some(text) = store.sources(section, EdgeKind::Has).iter().next() {
        push_unique(selected, text);
        edges.push((text, section, EdgeKind::Has));
    }
}

/// Append preserving first-seen order; neighborhood views are small, so the
/// linear scan beats hashing here.
fn push_unique(list: &mut Vec<u32>, node: u32) {
    if !list.contains(&node) {
        list.push(node);
    }
}

fn find_by_prop(
    store: &GraphStore,
    label: NodeLabel,
    key: &str,
    value: &str,
    language: Option<&str>,
) -> Option<u32> {
    let mut members = store.nodes_with_prop_eq(label, key, value);
    if let Some(language) = language {
        members &= store.nodes_with_prop_eq(label, "language", language);
    }
    members.iter().next()
}

// ============================================================================
// Assembly
// ============================================================================

/// Deduplicate nodes, render display labels, validate edges against the
/// final node set, and count discards.
fn finalize(
    store: &GraphStore,
    selected: Vec<u32>,
    candidate_edges: Vec<(u32, u32, EdgeKind)>,
    message: Option<String>,
) -> GraphView {
    let mut seen: HashSet<u32> = HashSet::new();
    let mut nodes = Vec::new();
    for node in selected {
        if !seen.insert(node) {
            continue;
        }
        if let Some(view) = render_node(store, node) {
            nodes.push(view);
        }
    }

    let node_set: RoaringBitmap = seen.iter().copied().collect();
    let mut edges = Vec::new();
    let mut dropped = 0usize;
    let mut emitted: HashSet<(u32, u32, EdgeKind)> = HashSet::new();
    for (source, target, kind) in candidate_edges {
        if !node_set.contains(source) || !node_set.contains(target) {
            dropped += 1;
            continue;
        }
        if !emitted.insert((source, target, kind)) {
            continue;
        }
        edges.push(ViewEdge {
            id: format!("edge-{}", edges.len()),
            source: store.external_id(source).unwrap_or_default(),
            target: store.external_id(target).unwrap_or_default(),
            edge_type: kind.as_str().to_string(),
        });
    }

    if dropped > 0 {
        tracing::warn!(dropped, "discarded edges with endpoints outside the view");
    }

    let stats = ViewStats {
        node_count: nodes.len(),
        edge_count: edges.len(),
        dropped_edge_count: dropped,
    };
    GraphView {
        nodes,
        edges,
        stats,
        message,
    }
}

fn render_node(store: &GraphStore, node: u32) -> Option<ViewNode> {
    let view = store.node_view(node)?;
    let label = display_label(&view.label, &view.id, &view.props);
    Some(ViewNode {
        id: view.id,
        label,
        node_type: view.label.as_str().to_string(),
        props: view.props,
    })
}

/// Type-preferred display text, truncated only for display.
fn display_label(label: &NodeLabel, id: &str, props: &BTreeMap<String, String>) -> String {
    let pick = |key: &str| props.get(key).filter(|v| !v.is_empty()).cloned();
    match label {
        NodeLabel::Text => pick("title").unwrap_or_else(|| id.to_string()),
        NodeLabel::Word => pick("surface_form").unwrap_or_else(|| id.to_string()),
        NodeLabel::Morpheme => pick("surface_form")
            .or_else(|| pick("citation_form"))
            .unwrap_or_else(|| id.to_string()),
        NodeLabel::Gloss => truncate_chars(&pick("annotation").unwrap_or_else(|| id.to_string()), 20),
        NodeLabel::Phrase => {
            truncate_chars(&pick("surface_text").unwrap_or_else(|| id.to_string()), 30)
        }
        NodeLabel::Section => id.to_string(),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}
