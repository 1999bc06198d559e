//! Graph persistence: map a canonical document onto nodes and edges.
//!
//! The contract in two sentences: merging is idempotent per entity id, and a
//! text's *structural subtree* is written only when the text id is new. A
//! re-submitted text refreshes its own metadata and nothing else. This is
//! the anti-duplication policy, not an accident; re-uploading a corpus file
//! must never mint a second phrase/word tree. Callers wanting a structural
//! re-import wipe first and re-ingest.
//!
//! The subtree walk is an iterative depth-first traversal with an explicit
//! work stack and an "already written in this call" set, so deeply nested
//! documents cannot exhaust the thread stack and shared words/morphemes are
//! written once.

use std::collections::HashSet;

use glossgraph_model::{
    gloss_id, join_pos, validate_text, GlossKind, InterlinearText, Morpheme, Phrase, Section, Word,
};
use glossgraph_store::{EdgeKind, GraphStore, NodeLabel};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// How many nodes of each kind one ingest call created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestCounters {
    pub sections: usize,
    pub phrases: usize,
    pub words: usize,
    pub morphemes: usize,
    pub glosses: usize,
}

/// Outcome of ingesting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub text_id: String,
    /// True only on the first ingestion of this text id.
    pub was_created: bool,
    pub counters: IngestCounters,
}

/// Work items for the iterative subtree walk.
enum Task<'a> {
    Section(&'a Section, u32),
    Phrase(&'a Phrase, u32),
    PhraseWord {
        word: &'a Word,
        phrase: u32,
        order: i64,
    },
    SectionWord {
        word: &'a Word,
        section: u32,
    },
    Morpheme(&'a Morpheme, u32),
}

/// Ingest one document into the store.
///
/// The existence check on the text id precedes the text merge and is the sole
/// source of `was_created`. Validation runs first; a malformed document
/// leaves the store untouched.
pub fn ingest_text(store: &mut GraphStore, text: &InterlinearText) -> Result<IngestOutcome> {
    validate_text(text)?;

    let was_created = store.node_by_id(NodeLabel::Text, &text.id).is_none();

    let text_node = store
        .merge_node(
            NodeLabel::Text,
            &text.id,
            &[
                ("title", text.title.as_deref()),
                ("source", text.source.as_deref()),
                ("comment", text.comment.as_deref()),
                ("language", text.language.as_deref()),
            ],
        )
        .node;

    let mut counters = IngestCounters::default();

    if was_created {
        write_subtree(store, text, text_node, &mut counters)?;
    } else {
        tracing::debug!(text_id = %text.id, "text already present; structural subtree skipped");
    }

    Ok(IngestOutcome {
        text_id: text.id.clone(),
        was_created,
        counters,
    })
}

fn write_subtree(
    store: &mut GraphStore,
    text: &InterlinearText,
    text_node: u32,
    counters: &mut IngestCounters,
) -> Result<()> {
    let mut written: HashSet<(NodeLabel, &str)> = HashSet::new();
    let mut stack: Vec<Task<'_>> = Vec::new();

    // Reverse push keeps pops in document order; section order itself is
    // carried as a property, so this only affects internal-id locality.
    for section in text.sections.iter().rev() {
        stack.push(Task::Section(section, text_node));
    }

    while let Some(task) = stack.pop() {
        match task {
            Task::Section(section, parent) => {
                let node = store
                    .merge_node(
                        NodeLabel::Section,
                        &section.id,
                        &[("order", Some(section.order.to_string().as_str()))],
                    )
                    .node;
                counters.sections += 1;
                link(store, parent, EdgeKind::Has, node, None, &section.id)?;

                for word in section.words.iter().rev() {
                    stack.push(Task::SectionWord {
                        word,
                        section: node,
                    });
                }
                for phrase in section.phrases.iter().rev() {
                    stack.push(Task::Phrase(phrase, node));
                }
            }

            Task::Phrase(phrase, parent) => {
                let node = store
                    .merge_node(
                        NodeLabel::Phrase,
                        &phrase.id,
                        &[
                            ("order", Some(phrase.order.to_string().as_str())),
                            ("segnum", phrase.segnum.as_deref()),
                            ("surface_text", phrase.surface_text.as_deref()),
                            ("language", phrase.language.as_deref()),
                        ],
                    )
                    .node;
                counters.phrases += 1;
                link(store, parent, EdgeKind::Has, node, None, &phrase.id)?;

                for (idx, word) in phrase.words.iter().enumerate().rev() {
                    stack.push(Task::PhraseWord {
                        word,
                        phrase: node,
                        order: idx as i64,
                    });
                }
            }

            Task::PhraseWord {
                word,
                phrase,
                order,
            } => {
                let (node, fresh) = write_word(store, word, &mut written, counters)?;
                link(store, phrase, EdgeKind::ComposedOf, node, Some(order), &word.id)?;
                if fresh {
                    for morpheme in word.morphemes.iter().rev() {
                        stack.push(Task::Morpheme(morpheme, node));
                    }
                }
            }

            Task::SectionWord { word, section } => {
                let (node, fresh) = write_word(store, word, &mut written, counters)?;
                link(store, section, EdgeKind::Has, node, None, &word.id)?;
                if fresh {
                    for morpheme in word.morphemes.iter().rev() {
                        stack.push(Task::Morpheme(morpheme, node));
                    }
                }
            }

            Task::Morpheme(morpheme, word_node) => {
                let node = write_morpheme(store, morpheme, &mut written, counters)?;
                link(store, word_node, EdgeKind::MadeOf, node, None, &morpheme.id)?;
            }
        }
    }

    Ok(())
}

/// Merge one word node. The `fresh` flag is false when this call already
/// wrote the word (a shared lexical node repeated across phrases); in that
/// case its morphemes and gloss are already queued or written, so the caller
/// skips re-expanding them.
fn write_word<'a>(
    store: &mut GraphStore,
    word: &'a Word,
    written: &mut HashSet<(NodeLabel, &'a str)>,
    counters: &mut IngestCounters,
) -> Result<(u32, bool)> {
    let pos_flat = join_pos(&word.pos);
    let node = store
        .merge_node(
            NodeLabel::Word,
            &word.id,
            &[
                ("surface_form", word.surface_form.as_deref()),
                ("gloss", word.gloss.as_deref()),
                (
                    "pos",
                    if pos_flat.is_empty() {
                        None
                    } else {
                        Some(pos_flat.as_str())
                    },
                ),
                ("language", word.language.as_deref()),
            ],
        )
        .node;

    let fresh = written.insert((NodeLabel::Word, word.id.as_str()));
    if fresh {
        counters.words += 1;
        if let Some(gloss) = word.gloss.as_deref().filter(|g| !g.is_empty()) {
            write_gloss(store, GlossKind::Word, &word.id, node, gloss, counters)?;
        }
    }
    Ok((node, fresh))
}

fn write_morpheme<'a>(
    store: &mut GraphStore,
    morpheme: &'a Morpheme,
    written: &mut HashSet<(NodeLabel, &'a str)>,
    counters: &mut IngestCounters,
) -> Result<u32> {
    let msa_flat = morpheme.msa.as_ref().map(|m| m.flatten());
    let node = store
        .merge_node(
            NodeLabel::Morpheme,
            &morpheme.id,
            &[
                ("type", Some(morpheme.morpheme_type.as_str())),
                ("surface_form", morpheme.surface_form.as_deref()),
                ("citation_form", morpheme.citation_form.as_deref()),
                ("gloss", morpheme.gloss.as_deref()),
                ("msa", msa_flat.as_deref().filter(|m| !m.is_empty())),
                ("language", morpheme.language.as_deref()),
                ("original_guid", morpheme.original_guid.as_deref()),
            ],
        )
        .node;

    if written.insert((NodeLabel::Morpheme, morpheme.id.as_str())) {
        counters.morphemes += 1;
        if let Some(gloss) = morpheme.gloss.as_deref().filter(|g| !g.is_empty()) {
            write_gloss(store, GlossKind::Morpheme, &morpheme.id, node, gloss, counters)?;
        }
    }
    Ok(node)
}

/// Synthesize the gloss annotation node for one glossed entity.
///
/// The gloss id is derived from the analyzed entity's id, so repeated
/// ingestion of the same word can never create a second gloss node.
fn write_gloss(
    store: &mut GraphStore,
    kind: GlossKind,
    entity_id: &str,
    entity_node: u32,
    annotation: &str,
    counters: &mut IngestCounters,
) -> Result<()> {
    let id = gloss_id(kind, entity_id);
    let merged = store.merge_node(
        NodeLabel::Gloss,
        &id,
        &[
            ("annotation", Some(annotation)),
            ("gloss_type", Some(kind.as_str())),
            ("language", Some("en")),
        ],
    );
    if merged.created {
        counters.glosses += 1;
    }
    link(store, merged.node, EdgeKind::Analyzes, entity_node, None, &id)
}

fn link(
    store: &mut GraphStore,
    source: u32,
    kind: EdgeKind,
    target: u32,
    order: Option<i64>,
    entity: &str,
) -> Result<()> {
    store
        .merge_edge(source, kind, target, order)
        .map_err(|e| EngineError::graph("merge_edge", entity, e))?;
    Ok(())
}
