//! Interchange JSON rendering.
//!
//! Mirrors the XML nesting as plain data: an export timestamp plus a `texts`
//! array. Consumers that do not speak the XML dialect (web frontends,
//! notebooks) ingest this form directly.

use chrono::Utc;
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::export::TextExport;

#[derive(Serialize)]
struct JsonDocument<'a> {
    exported_at: String,
    texts: &'a [TextExport],
}

pub fn render(texts: &[TextExport]) -> Result<String> {
    let document = JsonDocument {
        exported_at: Utc::now().to_rfc3339(),
        texts,
    };
    serde_json::to_string_pretty(&document).map_err(|e| EngineError::Export {
        entity: texts.first().map(|t| t.id.clone()).unwrap_or_default(),
        reason: e.to_string(),
    })
}
