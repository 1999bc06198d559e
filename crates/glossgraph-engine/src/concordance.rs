//! Concordance (KWIC) search.
//!
//! The store's edges are unordered sets; linear word sequence exists only as
//! the `order` payload on `COMPOSED_OF` edges. This module re-materializes
//! the sequence per matching phrase and cuts fixed-size context windows
//! around each match.
//!
//! Read-only; safe for unlimited concurrent callers.

use std::collections::BTreeSet;

use glossgraph_store::{EdgeKind, GraphStore, NodeLabel};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

/// What kind of entity the pattern is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTarget {
    Word,
    Morpheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcordanceQuery {
    pub target: SearchTarget,
    /// Case-sensitive substring matched against surface/citation/gloss text.
    pub pattern: String,
    pub language: Option<String>,
    /// Window size on each side, in words.
    pub context_size: usize,
    /// Bounds the number of results, not the windows.
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcordanceHit {
    /// Surface form of the matched entity.
    pub target: String,
    /// Up to `context_size` words preceding the match; empty at phrase start.
    pub left_context: Vec<String>,
    /// Up to `context_size` words following the match; empty at phrase end.
    pub right_context: Vec<String>,
    pub phrase_id: String,
    pub text_title: String,
    pub segnum: String,
    /// The match's `order` value within its phrase.
    pub word_index: i64,
    /// Gloss annotations reachable from the match.
    pub glosses: Vec<String>,
}

/// One word occurrence in a phrase, ordered by `(order, word id)`.
///
/// The secondary key is the documented tie-break: duplicate `order` values
/// are a data-quality condition the search tolerates by picking the
/// lowest-id word deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Slot {
    order: i64,
    word_id: String,
    surface: String,
}

pub fn search(store: &GraphStore, query: &ConcordanceQuery) -> Vec<ConcordanceHit> {
    let (label, fields): (NodeLabel, &[&str]) = match query.target {
        SearchTarget::Word => (NodeLabel::Word, &["surface_form", "gloss"]),
        SearchTarget::Morpheme => (
            NodeLabel::Morpheme,
            &["surface_form", "citation_form", "gloss"],
        ),
    };

    let mut matches = store.nodes_with_prop_containing(label, fields, &query.pattern);
    if let Some(language) = query.language.as_deref() {
        matches &= store.nodes_with_prop_eq(label, "language", language);
    }

    let mut hits = Vec::new();
    for matched in matches.iter() {
        let words: RoaringBitmap = match query.target {
            SearchTarget::Word => {
                let mut bm = RoaringBitmap::new();
                bm.insert(matched);
                bm
            }
            // A morpheme match surfaces once per containing word.
            SearchTarget::Morpheme => store.sources(matched, EdgeKind::MadeOf),
        };

        let target_surface = surface_of(store, matched);
        let glosses = glosses_of(store, matched);

        for word in words.iter() {
            for &edge_id in store.incoming(word, EdgeKind::ComposedOf) {
                let Some(edge) = store.edge(edge_id) else {
                    continue;
                };
                let Some(order) = edge.order else {
                    continue;
                };
                let phrase = edge.source;
                hits.push(build_hit(
                    store,
                    phrase,
                    order,
                    target_surface.clone(),
                    glosses.clone(),
                    query.context_size,
                ));
            }
        }
    }

    hits.sort_by(|a, b| {
        (&a.text_title, &a.segnum, a.word_index).cmp(&(&b.text_title, &b.segnum, b.word_index))
    });
    hits.truncate(query.limit);
    hits
}

fn build_hit(
    store: &GraphStore,
    phrase: u32,
    word_index: i64,
    target: String,
    glosses: Vec<String>,
    context_size: usize,
) -> ConcordanceHit {
    let slots = phrase_slots(store, phrase);

    // Position by order equality; with the slots sorted on (order, word id)
    // the first equal-order slot is the lowest-id word.
    let position = slots.iter().position(|s| s.order == word_index);

    let (left_context, right_context) = match position {
        Some(pos) => {
            let left = slots[pos.saturating_sub(context_size)..pos]
                .iter()
                .map(|s| s.surface.clone())
                .collect();
            let right_end = (pos + 1 + context_size).min(slots.len());
            let right = slots[(pos + 1).min(slots.len())..right_end]
                .iter()
                .map(|s| s.surface.clone())
                .collect();
            (left, right)
        }
        None => (Vec::new(), Vec::new()),
    };

    let (text_title, segnum) = phrase_provenance(store, phrase);

    ConcordanceHit {
        target,
        left_context,
        right_context,
        phrase_id: store.external_id(phrase).unwrap_or_default(),
        text_title,
        segnum,
        word_index,
        glosses,
    }
}

/// All word slots of a phrase, sorted by `(order, word id)`.
fn phrase_slots(store: &GraphStore, phrase: u32) -> Vec<Slot> {
    let mut slots: Vec<Slot> = store
        .outgoing(phrase, EdgeKind::ComposedOf)
        .iter()
        .filter_map(|&edge_id| {
            let edge = store.edge(edge_id)?;
            Some(Slot {
                order: edge.order?,
                word_id: store.external_id(edge.target)?,
                surface: surface_of(store, edge.target),
            })
        })
        .collect();
    slots.sort();
    slots
}

/// Walk Phrase ← Section ← Text and pull display fields.
fn phrase_provenance(store: &GraphStore, phrase: u32) -> (String, String) {
    let segnum = store.prop(phrase, "segnum").unwrap_or_default();
    let section = store.sources(phrase, EdgeKind::Has).iter().next();
    let title = section
        .and_then(|s| store.sources(s, EdgeKind::Has).iter().next())
        .and_then(|t| store.prop(t, "title"))
        .unwrap_or_default();
    (title, segnum)
}

fn surface_of(store: &GraphStore, node: u32) -> String {
    store
        .prop(node, "surface_form")
        .or_else(|| store.prop(node, "citation_form"))
        .unwrap_or_default()
}

fn glosses_of(store: &GraphStore, node: u32) -> Vec<String> {
    let mut out = BTreeSet::new();
    for gloss in store.sources(node, EdgeKind::Analyzes).iter() {
        if let Some(annotation) = store.prop(gloss, "annotation") {
            out.insert(annotation);
        }
    }
    out.into_iter().collect()
}
