//! Document validation.
//!
//! Runs before any graph write so a malformed document is rejected whole,
//! with no partial subtree left behind.

use std::collections::HashSet;

use thiserror::Error;

use crate::document::{InterlinearText, Phrase, Section, Word};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entity} is missing a stable id")]
    MissingId { entity: &'static str },

    #[error("duplicate {entity} id `{id}` in document")]
    DuplicateId { entity: &'static str, id: String },

    #[error("section `{section}` has negative order {order}")]
    NegativeSectionOrder { section: String, order: i64 },
}

/// Validate one document against the ingestion contract.
///
/// Checks: every entity has a non-empty id; ids are unique per entity kind
/// within the document; section orders are non-negative. Word order inside a
/// phrase is positional (assigned at ingest), so it needs no check here.
pub fn validate_text(text: &InterlinearText) -> Result<(), ValidationError> {
    let mut checker = IdChecker::default();
    checker.check("text", &text.id)?;

    for section in &text.sections {
        validate_section(section, &mut checker)?;
    }
    Ok(())
}

fn validate_section(section: &Section, checker: &mut IdChecker) -> Result<(), ValidationError> {
    checker.check("section", &section.id)?;
    if section.order < 0 {
        return Err(ValidationError::NegativeSectionOrder {
            section: section.id.clone(),
            order: section.order,
        });
    }
    for phrase in &section.phrases {
        validate_phrase(phrase, checker)?;
    }
    for word in &section.words {
        validate_word(word, checker)?;
    }
    Ok(())
}

fn validate_phrase(phrase: &Phrase, checker: &mut IdChecker) -> Result<(), ValidationError> {
    checker.check("phrase", &phrase.id)?;
    for word in &phrase.words {
        validate_word(word, checker)?;
    }
    Ok(())
}

fn validate_word(word: &Word, checker: &mut IdChecker) -> Result<(), ValidationError> {
    // Words may legitimately repeat across phrases (a shared lexical node),
    // so only emptiness is checked for them.
    if word.id.is_empty() {
        return Err(ValidationError::MissingId { entity: "word" });
    }
    for morpheme in &word.morphemes {
        if morpheme.id.is_empty() {
            return Err(ValidationError::MissingId { entity: "morpheme" });
        }
    }
    Ok(())
}

/// Tracks ids already seen per structural entity kind.
#[derive(Default)]
struct IdChecker {
    seen: HashSet<(&'static str, String)>,
}

impl IdChecker {
    fn check(&mut self, entity: &'static str, id: &str) -> Result<(), ValidationError> {
        if id.is_empty() {
            return Err(ValidationError::MissingId { entity });
        }
        if !self.seen.insert((entity, id.to_string())) {
            return Err(ValidationError::DuplicateId {
                entity,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
