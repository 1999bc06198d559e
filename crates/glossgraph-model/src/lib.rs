//! Glossgraph canonical document model.
//!
//! This crate defines the **only** accepted ingestion contract: a typed tree
//!
//! ```text
//! InterlinearText → Section → Phrase → Word → Morpheme
//! ```
//!
//! produced upstream by interchange-format parsers (flextext, ELAN, ...).
//! Those parsers are deliberately *not* part of this workspace; the model's
//! serde form doubles as a language-neutral JSON representation that any
//! parser can emit.
//!
//! Besides the tree itself, the crate owns the two normalizations that both
//! the persistence and export layers must apply identically:
//!
//! - part-of-speech tag sequences flatten to a single `,`-joined string
//!   ([`join_pos`] / [`split_pos`]);
//! - morphosyntactic analysis values arrive as maps, sequences or scalars and
//!   flatten through one canonical function ([`MsaValue::flatten`]).

pub mod document;
pub mod msa;
pub mod validate;

pub use document::{
    gloss_id, is_punctuation_tag, join_pos, split_pos, GlossKind, InterlinearText, Morpheme,
    MorphemeType, Phrase, Section, Word,
};
pub use msa::MsaValue;
pub use validate::{validate_text, ValidationError};
