//! Integration tests for the complete Glossgraph pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - canonical JSON document → model → ingest → graph store
//! - search / extraction / export against the same corpus
//! - snapshot persistence across manager instances
//!
//! Run with: cargo test --test integration_tests

use glossgraph_engine::{ConcordanceQuery, Corpus, SearchTarget, ViewOptions};
use glossgraph_model::InterlinearText;
use tempfile::tempdir;

/// A canonical document exactly as an upstream parser would emit it.
const SAMPLE_DOCUMENT: &str = r#"{
  "id": "text-demo",
  "title": "Demo Text",
  "source": "Field Session",
  "language": "en",
  "sections": [
    {
      "id": "section-1",
      "order": 0,
      "phrases": [
        {
          "id": "phrase-1",
          "order": 0,
          "segnum": "1",
          "surface_text": "demo phrase .",
          "language": "eng",
          "words": [
            {
              "id": "word-1",
              "surface_form": "demo",
              "gloss": "DEM",
              "pos": ["N"],
              "language": "eng",
              "morphemes": [
                {
                  "id": "morph-1",
                  "type": "stem",
                  "surface_form": "demo",
                  "citation_form": "demo",
                  "gloss": "DEM",
                  "msa": {"pos": "n", "num": "sg"},
                  "language": "eng",
                  "original_guid": "orig-1234"
                }
              ]
            },
            {
              "id": "word-2",
              "surface_form": "phrase",
              "gloss": "PHR",
              "pos": ["N"],
              "morphemes": [
                {
                  "id": "morph-2",
                  "type": "stem",
                  "surface_form": "phrase",
                  "gloss": "PHR",
                  "msa": ["n", "sg"]
                }
              ]
            },
            {
              "id": "word-3",
              "surface_form": ".",
              "pos": ["PUNCT"],
              "morphemes": []
            }
          ]
        }
      ],
      "words": []
    }
  ]
}"#;

fn parse_sample() -> InterlinearText {
    serde_json::from_str(SAMPLE_DOCUMENT).expect("canonical document parses")
}

#[test]
fn full_pipeline_ingest_search_extract_export() {
    let corpus = Corpus::new();

    let document = parse_sample();
    let outcome = corpus.ingest(&document).unwrap();
    assert!(outcome.was_created);

    // Search finds the word with its window.
    let hits = corpus.search(&ConcordanceQuery {
        target: SearchTarget::Word,
        pattern: "demo".to_string(),
        language: None,
        context_size: 2,
        limit: 10,
    });
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].right_context, ["phrase", "."]);
    assert_eq!(hits[0].text_title, "Demo Text");

    // Extraction produces a consistent renderable view.
    let view = corpus.graph_view(&ViewOptions {
        text_id: Some("text-demo".to_string()),
        ..ViewOptions::default()
    });
    let node_ids: std::collections::HashSet<&str> =
        view.nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &view.edges {
        assert!(node_ids.contains(edge.source.as_str()));
        assert!(node_ids.contains(edge.target.as_str()));
    }

    // Export regenerates interchange markup with the captured original guid.
    let xml = corpus.export_flextext(&["text-demo".to_string()]).unwrap();
    assert!(xml.contains("<document version=\"2\">"));
    assert!(xml.contains("guid=\"orig-1234\""));
    assert!(!xml.contains("guid=\"morph-1\""));
    // Map-shaped msa flattened canonically (sorted keys).
    assert!(xml.contains("<item type=\"msa\" lang=\"en\">num:sg,pos:n</item>"));
    // Sequence-shaped msa flattened by joining.
    assert!(xml.contains("<item type=\"msa\" lang=\"en\">n,sg</item>"));
    // Punctuation classification survives.
    assert!(xml.contains("<item type=\"punct\""));
}

#[test]
fn re_ingesting_the_same_document_is_invisible() {
    let corpus = Corpus::new();
    let document = parse_sample();

    corpus.ingest(&document).unwrap();
    let stats_once = corpus.stats();
    let xml_once = corpus.export_flextext(&["text-demo".to_string()]).unwrap();

    let second = corpus.ingest(&document).unwrap();
    assert!(!second.was_created);

    assert_eq!(corpus.stats(), stats_once);
    let xml_twice = corpus.export_flextext(&["text-demo".to_string()]).unwrap();
    assert_eq!(xml_once, xml_twice);
}

#[test]
fn snapshot_survives_manager_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("demo.glsg");

    {
        let corpus = Corpus::new();
        corpus.ingest(&parse_sample()).unwrap();
        corpus.save(&path).unwrap();
    }

    let corpus = Corpus::open(&path).unwrap();
    assert_eq!(corpus.stats().texts, 1);

    let hits = corpus.search(&ConcordanceQuery {
        target: SearchTarget::Morpheme,
        pattern: "demo".to_string(),
        language: None,
        context_size: 1,
        limit: 10,
    });
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].glosses, ["DEM"]);
}

#[test]
fn canonical_json_round_trips_through_the_model() {
    let document = parse_sample();
    let serialized = serde_json::to_string(&document).unwrap();
    let reparsed: InterlinearText = serde_json::from_str(&serialized).unwrap();
    assert_eq!(document, reparsed);
}
