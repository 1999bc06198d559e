//! The interlinear document tree.
//!
//! Every entity carries a caller-supplied stable `id`, unique within its kind.
//! Ids are opaque strings; the graph layer treats them as external identity
//! and never synthesizes replacements for them (except for [`GlossKind`]
//! annotations, whose ids are *derived* so repeated ingestion cannot mint
//! duplicates).

use serde::{Deserialize, Serialize};

use crate::msa::MsaValue;

/// Root of one corpus document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterlinearText {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Grouping unit within a text (a flextext "paragraph").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub phrases: Vec<Phrase>,
    /// Words attached directly to the section, outside any phrase.
    ///
    /// These occur in tier-oriented sources that have no sentence structure.
    #[serde(default)]
    pub words: Vec<Word>,
}

/// A sentence/utterance within a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    pub id: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub segnum: Option<String>,
    #[serde(default)]
    pub surface_text: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub words: Vec<Word>,
}

/// Leaf lexical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: String,
    #[serde(default)]
    pub surface_form: Option<String>,
    #[serde(default)]
    pub gloss: Option<String>,
    /// Part-of-speech tag sequence; flattened for storage via [`join_pos`].
    #[serde(default)]
    pub pos: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub morphemes: Vec<Morpheme>,
}

impl Word {
    /// Punctuation words export as bare `punct` leaves with no morphology.
    pub fn is_punctuation(&self) -> bool {
        self.pos.iter().any(|tag| is_punctuation_tag(tag))
    }
}

/// Sub-word unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Morpheme {
    pub id: String,
    #[serde(rename = "type")]
    pub morpheme_type: MorphemeType,
    #[serde(default)]
    pub surface_form: Option<String>,
    #[serde(default)]
    pub citation_form: Option<String>,
    #[serde(default)]
    pub gloss: Option<String>,
    #[serde(default)]
    pub msa: Option<MsaValue>,
    #[serde(default)]
    pub language: Option<String>,
    /// Identifier observed in the original interchange source, when the
    /// parser captured one. Export re-emits it in place of the storage id;
    /// see the export layer for the shared-guid rule.
    #[serde(default)]
    pub original_guid: Option<String>,
}

/// Enumerated morpheme classification (flextext `morph type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MorphemeType {
    Stem,
    Root,
    Prefix,
    Suffix,
    Infix,
    Circumfix,
    Proclitic,
    Enclitic,
    Particle,
}

impl MorphemeType {
    pub fn as_str(self) -> &'static str {
        match self {
            MorphemeType::Stem => "stem",
            MorphemeType::Root => "root",
            MorphemeType::Prefix => "prefix",
            MorphemeType::Suffix => "suffix",
            MorphemeType::Infix => "infix",
            MorphemeType::Circumfix => "circumfix",
            MorphemeType::Proclitic => "proclitic",
            MorphemeType::Enclitic => "enclitic",
            MorphemeType::Particle => "particle",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stem" => Some(MorphemeType::Stem),
            "root" | "bound root" => Some(MorphemeType::Root),
            "prefix" => Some(MorphemeType::Prefix),
            "suffix" => Some(MorphemeType::Suffix),
            "infix" => Some(MorphemeType::Infix),
            "circumfix" => Some(MorphemeType::Circumfix),
            "proclitic" => Some(MorphemeType::Proclitic),
            "enclitic" | "clitic" => Some(MorphemeType::Enclitic),
            "particle" => Some(MorphemeType::Particle),
            _ => None,
        }
    }
}

impl std::fmt::Display for MorphemeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of entity a synthesized gloss annotation analyzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlossKind {
    Word,
    Morpheme,
}

impl GlossKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GlossKind::Word => "word",
            GlossKind::Morpheme => "morpheme",
        }
    }
}

/// Derived id for the gloss annotation of one word or morpheme.
///
/// The derivation is deterministic so there is at most one gloss node per
/// annotated entity no matter how often the document is re-ingested.
pub fn gloss_id(kind: GlossKind, entity_id: &str) -> String {
    match kind {
        GlossKind::Word => format!("gloss-word-{entity_id}"),
        GlossKind::Morpheme => format!("gloss-morph-{entity_id}"),
    }
}

/// Flatten a part-of-speech tag sequence for storage.
pub fn join_pos(tags: &[String]) -> String {
    tags.join(",")
}

/// Recover a tag sequence from its stored flattened form.
///
/// The empty string splits to an empty sequence (not one empty tag).
pub fn split_pos(flat: &str) -> Vec<String> {
    if flat.is_empty() {
        return Vec::new();
    }
    flat.split(',').map(|t| t.to_string()).collect()
}

pub fn is_punctuation_tag(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("punct")
}
