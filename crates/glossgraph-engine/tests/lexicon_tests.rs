//! Lexicon search tests: filters, ordering, paging.

mod common;

use glossgraph_engine::ingest_text;
use glossgraph_engine::lexicon::{search_morphemes, search_words, MorphemeQuery, WordQuery};
use glossgraph_store::GraphStore;

fn sample_store() -> GraphStore {
    let mut store = GraphStore::new();
    ingest_text(&mut store, &common::sample_text()).unwrap();
    store
}

fn word_query() -> WordQuery {
    WordQuery {
        limit: 50,
        ..WordQuery::default()
    }
}

fn morpheme_query() -> MorphemeQuery {
    MorphemeQuery {
        limit: 50,
        ..MorphemeQuery::default()
    }
}

#[test]
fn words_filter_by_surface_substring() {
    let store = sample_store();
    let page = search_words(
        &store,
        &WordQuery {
            surface_form: Some("tabu".to_string()),
            ..word_query()
        },
    );
    assert_eq!(page.total, 2);
    // Ordered by surface form.
    assert_eq!(page.items[0].surface_form, "kitabu");
    assert_eq!(page.items[1].surface_form, "vitabu");
    assert_eq!(page.items[0].morpheme_count, 2);
    assert_eq!(page.items[0].pos, ["N"]);
}

#[test]
fn words_filter_by_contained_morpheme() {
    let store = sample_store();
    let page = search_words(
        &store,
        &WordQuery {
            contains_morpheme: Some("zuri".to_string()),
            ..word_query()
        },
    );
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].surface_form, "kizuri");
}

#[test]
fn words_filter_by_exact_pos() {
    let store = sample_store();
    let page = search_words(
        &store,
        &WordQuery {
            pos: Some("N".to_string()),
            ..word_query()
        },
    );
    assert_eq!(page.total, 2);

    // Exact match, not substring: "PUNCT" does not match "N".
    let punct = search_words(
        &store,
        &WordQuery {
            pos: Some("PUNCT".to_string()),
            ..word_query()
        },
    );
    assert_eq!(punct.total, 1);
    assert_eq!(punct.items[0].surface_form, ".");
}

#[test]
fn word_paging_reports_totals() {
    let store = sample_store();
    let page = search_words(
        &store,
        &WordQuery {
            limit: 2,
            offset: 2,
            ..WordQuery::default()
        },
    );
    assert_eq!(page.total, 4);
    assert_eq!(page.limit, 2);
    assert_eq!(page.offset, 2);
    assert_eq!(page.items.len(), 2);
}

#[test]
fn morphemes_filter_by_type_and_gloss() {
    let store = sample_store();

    let stems = search_morphemes(
        &store,
        &MorphemeQuery {
            morpheme_type: Some("stem".to_string()),
            ..morpheme_query()
        },
    );
    assert_eq!(stems.total, 2);
    // Ordered by citation form.
    assert_eq!(stems.items[0].citation_form, "tabu");
    assert_eq!(stems.items[1].citation_form, "zuri");

    let glossed = search_morphemes(
        &store,
        &MorphemeQuery {
            gloss: Some("CL".to_string()),
            ..morpheme_query()
        },
    );
    assert_eq!(glossed.total, 2);
    assert!(glossed.items.iter().all(|m| m.morpheme_type == "prefix"));
}

#[test]
fn empty_filters_return_everything() {
    let store = sample_store();
    assert_eq!(search_words(&store, &word_query()).total, 4);
    assert_eq!(search_morphemes(&store, &morpheme_query()).total, 4);
}
