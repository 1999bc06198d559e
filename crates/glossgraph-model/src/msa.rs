//! Morphosyntactic-analysis values.
//!
//! Interchange sources disagree about the shape of `msa`: some emit a plain
//! string, some a list of feature tags, some a feature→value map. The graph
//! store holds flat strings, so all three shapes funnel through one canonical
//! flattening. Keeping the function here (and nowhere else) guarantees the
//! persistence and export layers can never diverge on it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tagged variant for an `msa` value as delivered by a parser.
///
/// Deserialization is untagged: a JSON object becomes [`MsaValue::Map`], an
/// array [`MsaValue::Sequence`], a string [`MsaValue::Scalar`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MsaValue {
    Map(BTreeMap<String, String>),
    Sequence(Vec<String>),
    Scalar(String),
}

impl MsaValue {
    /// Canonical flattening.
    ///
    /// - `Map` → `key:value` pairs joined by `,`, in sorted key order (the
    ///   `BTreeMap` makes ordering independent of source-document key order);
    /// - `Sequence` → items joined by `,`;
    /// - `Scalar` → the string itself.
    pub fn flatten(&self) -> String {
        match self {
            MsaValue::Map(map) => map
                .iter()
                .map(|(k, v)| format!("{k}:{v}"))
                .collect::<Vec<_>>()
                .join(","),
            MsaValue::Sequence(items) => items.join(","),
            MsaValue::Scalar(s) => s.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MsaValue::Map(map) => map.is_empty(),
            MsaValue::Sequence(items) => items.is_empty(),
            MsaValue::Scalar(s) => s.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_flattens_in_sorted_key_order() {
        let msa: MsaValue =
            serde_json::from_str(r#"{"pos":"v","tense":"past","aspect":"perf"}"#).unwrap();
        assert_eq!(msa.flatten(), "aspect:perf,pos:v,tense:past");
    }

    #[test]
    fn sequence_and_scalar_flatten() {
        let seq: MsaValue = serde_json::from_str(r#"["v","tr"]"#).unwrap();
        assert_eq!(seq.flatten(), "v,tr");

        let scalar: MsaValue = serde_json::from_str(r#""n""#).unwrap();
        assert_eq!(scalar.flatten(), "n");
    }
}
