//! Interchange XML rendering.
//!
//! Output shape (one or more texts under a single root):
//!
//! ```text
//! <document version="2">
//!   <interlinear-text guid="...">
//!     <item type="title" lang="en">...</item>
//!     <paragraphs>
//!       <paragraph guid="...">
//!         <phrases>
//!           <phrase guid="...">
//!             <item type="segnum" .../> <item type="txt" .../>
//!             <words>
//!               <word guid="...">
//!                 <item type="txt|punct|gls|pos" .../>
//!                 <morphemes><morph guid="..." type="stem">...</morph></morphemes>
//! ```
//!
//! Vernacular-side items (`txt`, `cf`, `punct`) carry the word/phrase
//! language; analysis-side items (`gls`, `pos`, `msa`, `segnum`, metadata)
//! carry the text's analysis language. Empty optional fields are omitted
//! entirely, never emitted as empty elements.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{EngineError, Result};
use crate::export::{MorphemeExport, PhraseExport, TextExport, WordExport};

const DOCUMENT_VERSION: &str = "2";

pub fn render(texts: &[TextExport]) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write(&mut writer, texts).map_err(|e| EngineError::Export {
        entity: texts.first().map(|t| t.id.clone()).unwrap_or_default(),
        reason: e.to_string(),
    })?;
    String::from_utf8(writer.into_inner()).map_err(|e| EngineError::Export {
        entity: texts.first().map(|t| t.id.clone()).unwrap_or_default(),
        reason: e.to_string(),
    })
}

fn write(writer: &mut Writer<Vec<u8>>, texts: &[TextExport]) -> quick_xml::Result<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut document = BytesStart::new("document");
    document.push_attribute(("version", DOCUMENT_VERSION));
    writer.write_event(Event::Start(document))?;

    for text in texts {
        write_text(writer, text)?;
    }

    writer.write_event(Event::End(BytesEnd::new("document")))
}

fn write_text(writer: &mut Writer<Vec<u8>>, text: &TextExport) -> quick_xml::Result<()> {
    let analysis = text.analysis_language();

    let mut el = BytesStart::new("interlinear-text");
    el.push_attribute(("guid", text.id.as_str()));
    writer.write_event(Event::Start(el))?;

    write_item(writer, "title", Some(analysis), text.title.as_deref())?;
    write_item(writer, "source", Some(analysis), text.source.as_deref())?;
    write_item(writer, "comment", Some(analysis), text.comment.as_deref())?;

    writer.write_event(Event::Start(BytesStart::new("paragraphs")))?;
    for section in &text.sections {
        let mut paragraph = BytesStart::new("paragraph");
        paragraph.push_attribute(("guid", section.id.as_str()));
        writer.write_event(Event::Start(paragraph))?;

        writer.write_event(Event::Start(BytesStart::new("phrases")))?;
        for phrase in &section.phrases {
            write_phrase(writer, text, phrase)?;
        }
        writer.write_event(Event::End(BytesEnd::new("phrases")))?;

        writer.write_event(Event::End(BytesEnd::new("paragraph")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("paragraphs")))?;

    writer.write_event(Event::End(BytesEnd::new("interlinear-text")))
}

fn write_phrase(
    writer: &mut Writer<Vec<u8>>,
    text: &TextExport,
    phrase: &PhraseExport,
) -> quick_xml::Result<()> {
    let analysis = text.analysis_language();
    let vernacular = phrase.language.as_deref();

    let mut el = BytesStart::new("phrase");
    el.push_attribute(("guid", phrase.id.as_str()));
    writer.write_event(Event::Start(el))?;

    write_item(writer, "segnum", Some(analysis), phrase.segnum.as_deref())?;
    write_item(writer, "txt", vernacular, phrase.surface_text.as_deref())?;

    writer.write_event(Event::Start(BytesStart::new("words")))?;
    for word in &phrase.words {
        write_word(writer, text, vernacular, word)?;
    }
    writer.write_event(Event::End(BytesEnd::new("words")))?;

    writer.write_event(Event::End(BytesEnd::new("phrase")))
}

fn write_word(
    writer: &mut Writer<Vec<u8>>,
    text: &TextExport,
    phrase_language: Option<&str>,
    word: &WordExport,
) -> quick_xml::Result<()> {
    let analysis = text.analysis_language();
    let vernacular = word.language.as_deref().or(phrase_language);

    let mut el = BytesStart::new("word");
    el.push_attribute(("guid", word.id.as_str()));
    writer.write_event(Event::Start(el))?;

    if word.is_punctuation {
        // Punctuation is a bare leaf: no gloss, no pos, no morphology.
        write_item(writer, "punct", vernacular, word.surface_form.as_deref())?;
    } else {
        write_item(writer, "txt", vernacular, word.surface_form.as_deref())?;
        write_item(writer, "gls", Some(analysis), word.gloss.as_deref())?;
        let pos_flat = glossgraph_model::join_pos(&word.pos);
        write_item(
            writer,
            "pos",
            Some(analysis),
            (!pos_flat.is_empty()).then_some(pos_flat.as_str()),
        )?;

        if !word.morphemes.is_empty() {
            writer.write_event(Event::Start(BytesStart::new("morphemes")))?;
            for morpheme in &word.morphemes {
                write_morpheme(writer, analysis, vernacular, morpheme)?;
            }
            writer.write_event(Event::End(BytesEnd::new("morphemes")))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("word")))
}

fn write_morpheme(
    writer: &mut Writer<Vec<u8>>,
    analysis: &str,
    word_language: Option<&str>,
    morpheme: &MorphemeExport,
) -> quick_xml::Result<()> {
    let vernacular = morpheme.language.as_deref().or(word_language);

    let mut el = BytesStart::new("morph");
    // The captured original identifier wins over the storage id; morphemes
    // sharing an original guid all re-emit that same guid.
    el.push_attribute(("guid", morpheme.outgoing_guid()));
    if let Some(morpheme_type) = morpheme.morpheme_type.as_deref() {
        el.push_attribute(("type", morpheme_type));
    }
    writer.write_event(Event::Start(el))?;

    write_item(writer, "txt", vernacular, morpheme.surface_form.as_deref())?;
    write_item(writer, "cf", vernacular, morpheme.citation_form.as_deref())?;
    write_item(writer, "gls", Some(analysis), morpheme.gloss.as_deref())?;
    write_item(writer, "msa", Some(analysis), morpheme.msa.as_deref())?;

    writer.write_event(Event::End(BytesEnd::new("morph")))
}

/// One typed `item` leaf; skipped entirely when the value is absent.
fn write_item(
    writer: &mut Writer<Vec<u8>>,
    item_type: &str,
    lang: Option<&str>,
    value: Option<&str>,
) -> quick_xml::Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    let mut el = BytesStart::new("item");
    el.push_attribute(("type", item_type));
    if let Some(lang) = lang {
        el.push_attribute(("lang", lang));
    }
    writer.write_event(Event::Start(el))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("item")))
}
