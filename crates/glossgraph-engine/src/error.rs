//! Engine error taxonomy.
//!
//! Four conditions, four propagation policies:
//!
//! - [`EngineError::Validation`]: the document violates the ingestion
//!   contract; caller-fixable, nothing was written.
//! - [`EngineError::NotFound`]: a referenced seed entity does not exist.
//!   Search and extraction map this to an explicit empty result with a
//!   message; export treats it as fatal.
//! - [`EngineError::Graph`]: the store failed mid-operation. Surfaced with
//!   the operation and entity id; never retried here (merges are idempotent,
//!   so the caller may safely re-submit).
//! - [`EngineError::Export`]: the retrieved subgraph is structurally
//!   inconsistent; export fails closed rather than emitting broken markup.

use glossgraph_model::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid document: {0}")]
    Validation(#[from] ValidationError),

    #[error("{label} `{id}` not found")]
    NotFound { label: &'static str, id: String },

    #[error("graph operation `{operation}` failed for `{entity}`: {source}")]
    Graph {
        operation: &'static str,
        entity: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("export failed for `{entity}`: {reason}")]
    Export { entity: String, reason: String },
}

impl EngineError {
    pub(crate) fn graph(operation: &'static str, entity: impl Into<String>, source: anyhow::Error) -> Self {
        EngineError::Graph {
            operation,
            entity: entity.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
