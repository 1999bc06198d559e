//! Shared document fixtures.

#![allow(dead_code)]

use glossgraph_model::{InterlinearText, Morpheme, MorphemeType, Phrase, Section, Word};

pub fn morpheme(id: &str, ty: MorphemeType, surface: &str, gloss: Option<&str>) -> Morpheme {
    Morpheme {
        id: id.to_string(),
        morpheme_type: ty,
        surface_form: Some(surface.to_string()),
        citation_form: Some(surface.to_string()),
        gloss: gloss.map(str::to_string),
        msa: None,
        language: None,
        original_guid: None,
    }
}

pub fn word(
    id: &str,
    surface: &str,
    gloss: Option<&str>,
    pos: &[&str],
    morphemes: Vec<Morpheme>,
) -> Word {
    Word {
        id: id.to_string(),
        surface_form: Some(surface.to_string()),
        gloss: gloss.map(str::to_string),
        pos: pos.iter().map(|t| t.to_string()).collect(),
        language: None,
        morphemes,
    }
}

pub fn phrase(id: &str, order: i64, segnum: &str, surface: &str, words: Vec<Word>) -> Phrase {
    Phrase {
        id: id.to_string(),
        order,
        segnum: Some(segnum.to_string()),
        surface_text: Some(surface.to_string()),
        language: Some("eng".to_string()),
        words,
    }
}

/// A small corpus document with shared morphology:
///
/// - `kitabu` (book) and `vitabu` (books) share the stem morpheme `m-tabu`;
/// - the trailing `.` is punctuation with no morphology;
/// - words and morphemes carry glosses, so gloss nodes get synthesized.
pub fn sample_text() -> InterlinearText {
    let kitabu = word(
        "w-kitabu",
        "kitabu",
        Some("book"),
        &["N"],
        vec![
            morpheme("m-ki", MorphemeType::Prefix, "ki", Some("CL7")),
            morpheme("m-tabu", MorphemeType::Stem, "tabu", Some("book")),
        ],
    );
    let kizuri = word(
        "w-kizuri",
        "kizuri",
        Some("good"),
        &["ADJ"],
        vec![
            morpheme("m-ki", MorphemeType::Prefix, "ki", Some("CL7")),
            morpheme("m-zuri", MorphemeType::Stem, "zuri", Some("good")),
        ],
    );
    let vitabu = word(
        "w-vitabu",
        "vitabu",
        Some("books"),
        &["N"],
        vec![
            morpheme("m-vi", MorphemeType::Prefix, "vi", Some("CL8")),
            morpheme("m-tabu", MorphemeType::Stem, "tabu", Some("book")),
        ],
    );
    let stop = word("w-stop", ".", None, &["PUNCT"], vec![]);

    InterlinearText {
        id: "t-1".to_string(),
        title: Some("Hunting story".to_string()),
        source: Some("Field notes".to_string()),
        comment: None,
        language: Some("swh".to_string()),
        sections: vec![Section {
            id: "s-1".to_string(),
            order: 0,
            phrases: vec![
                phrase(
                    "p-1",
                    0,
                    "1",
                    "kitabu kizuri .",
                    vec![kitabu, kizuri, stop],
                ),
                phrase("p-2", 1, "2", "vitabu", vec![vitabu]),
            ],
            words: vec![],
        }],
    }
}

/// One phrase with the five words A..E, for context-window cases.
pub fn five_word_text() -> InterlinearText {
    let words = ["A", "B", "C", "D", "E"]
        .iter()
        .map(|s| word(&format!("w-{s}"), s, None, &[], vec![]))
        .collect();
    InterlinearText {
        id: "t-kwic".to_string(),
        title: Some("Window test".to_string()),
        source: None,
        comment: None,
        language: None,
        sections: vec![Section {
            id: "s-kwic".to_string(),
            order: 0,
            phrases: vec![phrase("p-kwic", 0, "1", "A B C D E", words)],
            words: vec![],
        }],
    }
}
