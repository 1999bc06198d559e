//! Export: regenerate the canonical interchange document from the graph.
//!
//! Two stages, deliberately separated:
//!
//! 1. [`fetch_text_export`] re-assembles the nested document tree from graph
//!    edges, sorting every level by its `order` (never by arrival order), and
//!    fails closed on structural inconsistency.
//! 2. The renderers ([`flextext`], [`json`]) turn the assembled tree into
//!    interchange markup. Both code paths consume the same explicit types;
//!    there is no per-format re-query.
//!
//! Identity preservation: a morpheme that carries a captured `original_guid`
//! exports that identifier instead of its storage id. Several morphemes may
//! share one `original_guid`; all of them re-emit it. That is the property
//! that makes `export ∘ ingest` invisible to the upstream tooling.

pub mod flextext;
pub mod json;

use glossgraph_model::split_pos;
use glossgraph_store::{EdgeKind, GraphStore, NodeLabel};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const DEFAULT_ANALYSIS_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextExport {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub sections: Vec<SectionExport>,
}

impl TextExport {
    /// Language tag for analysis-side items (glosses, pos, metadata).
    pub fn analysis_language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_ANALYSIS_LANGUAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionExport {
    pub id: String,
    pub order: i64,
    pub phrases: Vec<PhraseExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseExport {
    pub id: String,
    pub order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segnum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub words: Vec<WordExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordExport {
    pub id: String,
    pub order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gloss: Option<String>,
    pub pos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub is_punctuation: bool,
    pub morphemes: Vec<MorphemeExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphemeExport {
    pub id: String,
    /// Identifier captured from the original interchange source, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_guid: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub morpheme_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gloss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl MorphemeExport {
    /// The identifier the interchange document carries for this morpheme.
    pub fn outgoing_guid(&self) -> &str {
        self.original_guid.as_deref().unwrap_or(&self.id)
    }
}

/// Re-assemble the full export tree for one text.
///
/// A missing text is fatal here (unlike search/extraction, export has nothing
/// sensible to emit for an unknown id).
pub fn fetch_text_export(store: &GraphStore, text_id: &str) -> Result<TextExport> {
    let text = store
        .node_by_id(NodeLabel::Text, text_id)
        .ok_or(EngineError::NotFound {
            label: "Text",
            id: text_id.to_string(),
        })?;

    let mut sections = Vec::new();
    for section in store.targets(text, EdgeKind::Has).iter() {
        if store.label_of(section) != Some(NodeLabel::Section) {
            continue;
        }
        sections.push(fetch_section(store, section)?);
    }
    sections.sort_by(|a, b| (a.order, &a.id).cmp(&(b.order, &b.id)));

    Ok(TextExport {
        id: text_id.to_string(),
        title: nonempty_prop(store, text, "title"),
        source: nonempty_prop(store, text, "source"),
        comment: nonempty_prop(store, text, "comment"),
        language: normalized_language(store, text),
        sections,
    })
}

fn fetch_section(store: &GraphStore, section: u32) -> Result<SectionExport> {
    let id = external_id(store, section)?;

    let mut phrases = Vec::new();
    for phrase in store.targets(section, EdgeKind::Has).iter() {
        if store.label_of(phrase) != Some(NodeLabel::Phrase) {
            continue;
        }
        phrases.push(fetch_phrase(store, phrase)?);
    }
    phrases.sort_by(|a, b| (a.order, &a.id).cmp(&(b.order, &b.id)));

    Ok(SectionExport {
        order: order_prop(store, section),
        id,
        phrases,
    })
}

fn fetch_phrase(store: &GraphStore, phrase: u32) -> Result<PhraseExport> {
    let id = external_id(store, phrase)?;

    let mut words = Vec::new();
    for &edge_id in store.outgoing(phrase, EdgeKind::ComposedOf) {
        let edge = store.edge(edge_id).ok_or_else(|| EngineError::Export {
            entity: id.clone(),
            reason: format!("composition edge {edge_id} missing from store"),
        })?;
        if store.label_of(edge.target) != Some(NodeLabel::Word) {
            return Err(EngineError::Export {
                entity: id.clone(),
                reason: format!(
                    "phrase references node `{}` which is not a word",
                    store.external_id(edge.target).unwrap_or_default()
                ),
            });
        }
        words.push(fetch_word(store, edge.target, edge.order.unwrap_or(0))?);
    }
    words.sort_by(|a, b| (a.order, &a.id).cmp(&(b.order, &b.id)));

    Ok(PhraseExport {
        order: order_prop(store, phrase),
        segnum: nonempty_prop(store, phrase, "segnum"),
        surface_text: nonempty_prop(store, phrase, "surface_text"),
        language: nonempty_prop(store, phrase, "language"),
        id,
        words,
    })
}

fn fetch_word(store: &GraphStore, word: u32, order: i64) -> Result<WordExport> {
    let id = external_id(store, word)?;
    let pos = store
        .prop(word, "pos")
        .map(|flat| split_pos(&flat))
        .unwrap_or_default();
    let is_punctuation = pos.iter().any(|t| glossgraph_model::is_punctuation_tag(t));

    // Punctuation leaves carry no morphology even if stray edges exist.
    let morphemes = if is_punctuation {
        Vec::new()
    } else {
        // MADE_OF edge insertion order is the morpheme sequence within the
        // word; morphemes carry no order payload of their own.
        let mut out = Vec::new();
        for &edge_id in store.outgoing(word, EdgeKind::MadeOf) {
            let edge = store.edge(edge_id).ok_or_else(|| EngineError::Export {
                entity: id.clone(),
                reason: format!("morphology edge {edge_id} missing from store"),
            })?;
            out.push(fetch_morpheme(store, edge.target)?);
        }
        out
    };

    Ok(WordExport {
        order,
        surface_form: nonempty_prop(store, word, "surface_form"),
        gloss: nonempty_prop(store, word, "gloss"),
        pos,
        language: nonempty_prop(store, word, "language"),
        is_punctuation,
        morphemes,
        id,
    })
}

fn fetch_morpheme(store: &GraphStore, morpheme: u32) -> Result<MorphemeExport> {
    Ok(MorphemeExport {
        id: external_id(store, morpheme)?,
        original_guid: nonempty_prop(store, morpheme, "original_guid"),
        morpheme_type: nonempty_prop(store, morpheme, "type"),
        surface_form: nonempty_prop(store, morpheme, "surface_form"),
        citation_form: nonempty_prop(store, morpheme, "citation_form"),
        gloss: nonempty_prop(store, morpheme, "gloss"),
        msa: nonempty_prop(store, morpheme, "msa"),
        language: nonempty_prop(store, morpheme, "language"),
    })
}

fn external_id(store: &GraphStore, node: u32) -> Result<String> {
    store.external_id(node).ok_or_else(|| EngineError::Export {
        entity: format!("node {node}"),
        reason: "node has no external id".to_string(),
    })
}

fn nonempty_prop(store: &GraphStore, node: u32, key: &str) -> Option<String> {
    store.prop(node, key).filter(|v| !v.is_empty())
}

/// A literal `unknown` language tag is noise from upstream parsers and is
/// treated as absent.
fn normalized_language(store: &GraphStore, node: u32) -> Option<String> {
    nonempty_prop(store, node, "language").filter(|l| !l.eq_ignore_ascii_case("unknown"))
}

fn order_prop(store: &GraphStore, node: u32) -> i64 {
    store
        .prop(node, "order")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
