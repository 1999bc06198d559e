//! Flat lexicon search over words and morphemes.
//!
//! Unlike the concordance engine, these queries return entity records rather
//! than context windows (the shape a lexicon browser pages through). All text
//! filters are case-sensitive substring matches; `pos`, `type` and `language`
//! are exact.

use chrono::{DateTime, Utc};
use glossgraph_model::split_pos;
use glossgraph_store::{EdgeKind, GraphStore, NodeLabel};
use serde::{Deserialize, Serialize};

use crate::Page;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordQuery {
    pub surface_form: Option<String>,
    pub gloss: Option<String>,
    /// Exact match against the flattened tag list (e.g. `N` or `N,PL`).
    pub pos: Option<String>,
    pub language: Option<String>,
    /// Keep only words with a morpheme whose surface or citation form
    /// contains this.
    pub contains_morpheme: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub id: String,
    pub surface_form: String,
    pub gloss: String,
    pub pos: Vec<String>,
    pub language: String,
    pub morpheme_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MorphemeQuery {
    pub surface_form: Option<String>,
    pub citation_form: Option<String>,
    pub gloss: Option<String>,
    /// Exact enumerated type (e.g. `stem`).
    pub morpheme_type: Option<String>,
    pub language: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphemeRecord {
    pub id: String,
    pub morpheme_type: String,
    pub surface_form: String,
    pub citation_form: String,
    pub gloss: String,
    pub msa: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

pub fn search_words(store: &GraphStore, query: &WordQuery) -> Page<WordRecord> {
    let mut matched: Vec<WordRecord> = store
        .nodes_with_label(NodeLabel::Word)
        .iter()
        .filter(|&node| {
            prop_contains(store, node, "surface_form", query.surface_form.as_deref())
                && prop_contains(store, node, "gloss", query.gloss.as_deref())
                && prop_equals(store, node, "pos", query.pos.as_deref())
                && prop_equals(store, node, "language", query.language.as_deref())
                && morpheme_filter(store, node, query.contains_morpheme.as_deref())
        })
        .filter_map(|node| {
            Some(WordRecord {
                id: store.external_id(node)?,
                surface_form: store.prop(node, "surface_form").unwrap_or_default(),
                gloss: store.prop(node, "gloss").unwrap_or_default(),
                pos: store
                    .prop(node, "pos")
                    .map(|flat| split_pos(&flat))
                    .unwrap_or_default(),
                language: store.prop(node, "language").unwrap_or_default(),
                morpheme_count: store.targets(node, EdgeKind::MadeOf).len(),
                created_at: store.created_at(node)?,
            })
        })
        .collect();

    matched.sort_by(|a, b| (&a.surface_form, &a.id).cmp(&(&b.surface_form, &b.id)));
    paginate(matched, query.limit, query.offset)
}

pub fn search_morphemes(store: &GraphStore, query: &MorphemeQuery) -> Page<MorphemeRecord> {
    let mut matched: Vec<MorphemeRecord> = store
        .nodes_with_label(NodeLabel::Morpheme)
        .iter()
        .filter(|&node| {
            prop_contains(store, node, "surface_form", query.surface_form.as_deref())
                && prop_contains(store, node, "citation_form", query.citation_form.as_deref())
                && prop_contains(store, node, "gloss", query.gloss.as_deref())
                && prop_equals(store, node, "type", query.morpheme_type.as_deref())
                && prop_equals(store, node, "language", query.language.as_deref())
        })
        .filter_map(|node| {
            Some(MorphemeRecord {
                id: store.external_id(node)?,
                morpheme_type: store.prop(node, "type").unwrap_or_default(),
                surface_form: store.prop(node, "surface_form").unwrap_or_default(),
                citation_form: store.prop(node, "citation_form").unwrap_or_default(),
                gloss: store.prop(node, "gloss").unwrap_or_default(),
                msa: store.prop(node, "msa").unwrap_or_default(),
                language: store.prop(node, "language").unwrap_or_default(),
                created_at: store.created_at(node)?,
            })
        })
        .collect();

    matched.sort_by(|a, b| (&a.citation_form, &a.id).cmp(&(&b.citation_form, &b.id)));
    paginate(matched, query.limit, query.offset)
}

fn paginate<T>(items: Vec<T>, limit: usize, offset: usize) -> Page<T> {
    let total = items.len();
    let items: Vec<T> = items.into_iter().skip(offset).take(limit).collect();
    Page {
        total,
        limit,
        offset,
        items,
    }
}

fn prop_contains(store: &GraphStore, node: u32, key: &str, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => store
            .prop(node, key)
            .map(|v| v.contains(needle))
            .unwrap_or(false),
    }
}

fn prop_equals(store: &GraphStore, node: u32, key: &str, expected: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => store.prop(node, key).as_deref() == Some(expected),
    }
}

/// Word-level morpheme containment: any owned morpheme whose surface or
/// citation form contains the needle.
fn morpheme_filter(store: &GraphStore, word: u32, needle: Option<&str>) -> bool {
    let Some(needle) = needle else {
        return true;
    };
    store.targets(word, EdgeKind::MadeOf).iter().any(|m| {
        prop_contains(store, m, "surface_form", Some(needle))
            || prop_contains(store, m, "citation_form", Some(needle))
    })
}
