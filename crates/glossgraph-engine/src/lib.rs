//! Glossgraph engines.
//!
//! Four engines layered on the graph store, plus the [`Corpus`] manager that
//! owns the store and its snapshot lifecycle:
//!
//! - [`ingest`]: the sole writer of corpus structure (idempotent upsert,
//!   first-creation-only subtrees);
//! - [`concordance`]: KWIC search with order reconstruction;
//! - [`subgraph`]: bounded extraction for exploration;
//! - [`export`]: regeneration of the interchange formats.
//!
//! Scheduling model: synchronous request/response. Reads are pure queries and
//! run under a shared lock with unlimited concurrency; each ingest holds the
//! write lock for its whole document, so one ingestion appears atomic to
//! readers and two concurrent ingests of the same new text id cannot both
//! observe absence.

pub mod concordance;
pub mod error;
pub mod export;
pub mod ingest;
pub mod lexicon;
pub mod subgraph;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use glossgraph_model::InterlinearText;
use glossgraph_store::{EdgeKind, GraphStats, GraphStore, NodeLabel};

pub use concordance::{ConcordanceHit, ConcordanceQuery, SearchTarget};
pub use error::{EngineError, Result};
pub use export::{fetch_text_export, TextExport};
pub use ingest::{ingest_text, IngestCounters, IngestOutcome};
pub use lexicon::{MorphemeQuery, MorphemeRecord, WordQuery, WordRecord};
pub use subgraph::{
    clamp_per_type_limit, graph_view, morpheme_neighborhood, word_neighborhood, GraphView,
    ViewOptions, DEFAULT_PER_TYPE_LIMIT, MAX_PER_TYPE_LIMIT, MIN_PER_TYPE_LIMIT,
};

// ============================================================================
// Ingest journal
// ============================================================================

/// One recorded ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub text_id: String,
    pub was_created: bool,
    pub counters: IngestCounters,
}

// ============================================================================
// Text listing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSummary {
    pub id: String,
    pub title: String,
    pub source: String,
    pub comment: String,
    pub language: String,
    pub section_count: u64,
    pub word_count: u64,
    pub morpheme_count: u64,
    pub created_at: DateTime<Utc>,
}

/// A page of list results with paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub items: Vec<T>,
}

pub type TextPage = Page<TextSummary>;

// ============================================================================
// Corpus manager
// ============================================================================

/// Owns the shared graph store and serializes writes against it.
#[derive(Debug)]
pub struct Corpus {
    store: Arc<RwLock<GraphStore>>,
    journal: Mutex<Vec<IngestRecord>>,
}

impl Corpus {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(GraphStore::new())),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Load a corpus from a snapshot file.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| EngineError::graph("read_snapshot", path.display().to_string(), e.into()))?;
        let store = GraphStore::from_bytes(&bytes)
            .map_err(|e| EngineError::graph("decode_snapshot", path.display().to_string(), e))?;
        Ok(Self {
            store: Arc::new(RwLock::new(store)),
            journal: Mutex::new(Vec::new()),
        })
    }

    /// Write the corpus to a snapshot file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self
            .store
            .read()
            .to_bytes()
            .map_err(|e| EngineError::graph("encode_snapshot", path.display().to_string(), e))?;
        std::fs::write(path, bytes)
            .map_err(|e| EngineError::graph("write_snapshot", path.display().to_string(), e.into()))
    }

    // ========================================================================
    // Write path
    // ========================================================================

    /// Ingest one document. Holds the write lock for the whole document.
    pub fn ingest(&self, document: &InterlinearText) -> Result<IngestOutcome> {
        let outcome = {
            let mut store = self.store.write();
            ingest_text(&mut store, document)?
        };

        tracing::info!(
            text_id = %outcome.text_id,
            was_created = outcome.was_created,
            words = outcome.counters.words,
            morphemes = outcome.counters.morphemes,
            "document ingested"
        );

        self.journal.lock().push(IngestRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            text_id: outcome.text_id.clone(),
            was_created: outcome.was_created,
            counters: outcome.counters,
        });
        Ok(outcome)
    }

    /// Destructive corpus-wide wipe; returns what was deleted.
    pub fn wipe(&self) -> GraphStats {
        let deleted = self.store.write().wipe();
        tracing::warn!(?deleted, "corpus wiped");
        deleted
    }

    // ========================================================================
    // Read path
    // ========================================================================

    pub fn search(&self, query: &ConcordanceQuery) -> Vec<ConcordanceHit> {
        concordance::search(&self.store.read(), query)
    }

    pub fn graph_view(&self, options: &ViewOptions) -> GraphView {
        subgraph::graph_view(&self.store.read(), options)
    }

    pub fn word_neighborhood(&self, surface_form: &str, language: Option<&str>) -> GraphView {
        subgraph::word_neighborhood(&self.store.read(), surface_form, language)
    }

    pub fn morpheme_neighborhood(&self, form: &str, language: Option<&str>) -> GraphView {
        subgraph::morpheme_neighborhood(&self.store.read(), form, language)
    }

    pub fn search_words(&self, query: &WordQuery) -> Page<WordRecord> {
        lexicon::search_words(&self.store.read(), query)
    }

    pub fn search_morphemes(&self, query: &MorphemeQuery) -> Page<MorphemeRecord> {
        lexicon::search_morphemes(&self.store.read(), query)
    }

    pub fn fetch_text_export(&self, text_id: &str) -> Result<TextExport> {
        export::fetch_text_export(&self.store.read(), text_id)
    }

    /// Export one or more texts as interchange XML.
    pub fn export_flextext(&self, text_ids: &[String]) -> Result<String> {
        let store = self.store.read();
        let texts = text_ids
            .iter()
            .map(|id| export::fetch_text_export(&store, id))
            .collect::<Result<Vec<_>>>()?;
        export::flextext::render(&texts)
    }

    /// Export one or more texts as interchange JSON.
    pub fn export_json(&self, text_ids: &[String]) -> Result<String> {
        let store = self.store.read();
        let texts = text_ids
            .iter()
            .map(|id| export::fetch_text_export(&store, id))
            .collect::<Result<Vec<_>>>()?;
        export::json::render(&texts)
    }

    /// All text ids, for whole-corpus export.
    pub fn text_ids(&self) -> Vec<String> {
        let store = self.store.read();
        store
            .nodes_with_label(NodeLabel::Text)
            .iter()
            .filter_map(|n| store.external_id(n))
            .collect()
    }

    /// Text summaries with structural counts, newest first.
    pub fn texts(&self, language: Option<&str>, offset: usize, limit: usize) -> TextPage {
        let store = self.store.read();

        let mut summaries: Vec<TextSummary> = store
            .nodes_with_label(NodeLabel::Text)
            .iter()
            .filter(|&node| match language {
                Some(lang) => store.prop(node, "language").as_deref() == Some(lang),
                None => true,
            })
            .filter_map(|node| summarize_text(&store, node))
            .collect();

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = summaries.len();
        let items: Vec<TextSummary> = summaries.into_iter().skip(offset).take(limit).collect();
        TextPage {
            total,
            limit,
            offset,
            items,
        }
    }

    pub fn stats(&self) -> GraphStats {
        self.store.read().stats()
    }

    pub fn journal(&self) -> Vec<IngestRecord> {
        self.journal.lock().clone()
    }

    /// Direct read access for callers composing their own queries.
    pub fn with_store<R>(&self, f: impl FnOnce(&GraphStore) -> R) -> R {
        f(&self.store.read())
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize_text(store: &GraphStore, text: u32) -> Option<TextSummary> {
    let id = store.external_id(text)?;

    let mut sections = 0u64;
    let mut words = roaring::RoaringBitmap::new();
    for section in store.targets(text, EdgeKind::Has).iter() {
        if store.label_of(section) != Some(NodeLabel::Section) {
            continue;
        }
        sections += 1;
        // Direct words plus phrase words.
        for child in store.targets(section, EdgeKind::Has).iter() {
            match store.label_of(child) {
                Some(NodeLabel::Word) => {
                    words.insert(child);
                }
                Some(NodeLabel::Phrase) => {
                    words |= store.targets(child, EdgeKind::ComposedOf);
                }
                _ => {}
            }
        }
    }

    let mut morphemes = roaring::RoaringBitmap::new();
    for word in words.iter() {
        morphemes |= store.targets(word, EdgeKind::MadeOf);
    }

    let prop = |key: &str| store.prop(text, key).unwrap_or_default();
    Some(TextSummary {
        title: prop("title"),
        source: prop("source"),
        comment: prop("comment"),
        language: prop("language"),
        section_count: sections,
        word_count: words.len(),
        morpheme_count: morphemes.len(),
        created_at: store.created_at(text)?,
        id,
    })
}
