//! Glossgraph CLI
//!
//! Command-line interface for the interlinear corpus graph:
//! - ingesting canonical documents (the model's JSON form) into a snapshot
//! - concordance (KWIC) search
//! - bounded subgraph extraction for exploration
//! - re-export to the interchange formats (XML / JSON)
//! - corpus listing, statistics, and the destructive wipe

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use glossgraph_engine::{
    ConcordanceQuery, Corpus, MorphemeQuery, SearchTarget, ViewOptions, WordQuery,
    DEFAULT_PER_TYPE_LIMIT,
};
use glossgraph_model::InterlinearText;
use glossgraph_store::NodeLabel;

#[derive(Parser)]
#[command(name = "glossgraph")]
#[command(author, version, about = "Interlinear corpus graph engine")]
struct Cli {
    /// Snapshot file holding the corpus graph.
    #[arg(long, global = true, default_value = "corpus.glsg")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest canonical document files (JSON) into the corpus.
    Ingest {
        /// One or more document files; each holds a text or an array of texts.
        files: Vec<PathBuf>,
    },

    /// Concordance (KWIC) search over words or morphemes.
    Search {
        /// Case-sensitive substring to match.
        pattern: String,
        #[arg(long, value_enum, default_value_t = TargetArg::Word)]
        target: TargetArg,
        #[arg(long)]
        language: Option<String>,
        /// Context window size in words, each side.
        #[arg(long, default_value_t = 3)]
        context: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Extract a renderable subgraph (JSON on stdout or to a file).
    Graph {
        /// Anchor on one text id; omit for sampling mode.
        #[arg(long)]
        text_id: Option<String>,
        /// Neighborhood of one word (by surface form).
        #[arg(long, conflicts_with_all = ["text_id", "morpheme"])]
        word: Option<String>,
        /// Neighborhood of one morpheme (by form).
        #[arg(long, conflicts_with = "text_id")]
        morpheme: Option<String>,
        #[arg(long)]
        language: Option<String>,
        /// Comma-separated node types to sample (e.g. "Word,Gloss").
        #[arg(long)]
        types: Option<String>,
        /// Max nodes per type; clamped to [10, 1000].
        #[arg(long, default_value_t = DEFAULT_PER_TYPE_LIMIT)]
        limit: usize,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export texts back to the interchange format.
    Export {
        /// Texts to export; repeatable.
        #[arg(long = "text-id")]
        text_ids: Vec<String>,
        /// Export every text in the corpus.
        #[arg(long, conflicts_with = "text_ids")]
        all: bool,
        #[arg(long, value_enum, default_value_t = FormatArg::Flextext)]
        format: FormatArg,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Flat word search (lexicon records, not concordance windows).
    Words {
        #[arg(long)]
        surface: Option<String>,
        #[arg(long)]
        gloss: Option<String>,
        /// Exact flattened tag list, e.g. "N" or "N,PL".
        #[arg(long)]
        pos: Option<String>,
        #[arg(long)]
        language: Option<String>,
        /// Words containing a morpheme matching this form.
        #[arg(long)]
        morpheme: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Flat morpheme search.
    Morphemes {
        #[arg(long)]
        surface: Option<String>,
        #[arg(long)]
        citation: Option<String>,
        #[arg(long)]
        gloss: Option<String>,
        /// Exact enumerated type, e.g. "stem".
        #[arg(long = "type")]
        morpheme_type: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// List texts with structural counts.
    Texts {
        #[arg(long)]
        language: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Corpus-wide statistics.
    Stats,

    /// Delete the entire corpus. Irreversible.
    Wipe {
        /// Required confirmation.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    Word,
    Morpheme,
}

impl From<TargetArg> for SearchTarget {
    fn from(value: TargetArg) -> Self {
        match value {
            TargetArg::Word => SearchTarget::Word,
            TargetArg::Morpheme => SearchTarget::Morpheme,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Flextext,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let corpus = if cli.db.exists() {
        Corpus::open(&cli.db).with_context(|| format!("opening snapshot {}", cli.db.display()))?
    } else {
        Corpus::new()
    };

    match cli.command {
        Commands::Ingest { files } => cmd_ingest(&corpus, &cli.db, &files),
        Commands::Search {
            pattern,
            target,
            language,
            context,
            limit,
        } => cmd_search(&corpus, pattern, target, language, context, limit),
        Commands::Graph {
            text_id,
            word,
            morpheme,
            language,
            types,
            limit,
            output,
        } => cmd_graph(&corpus, text_id, word, morpheme, language, types, limit, output),
        Commands::Export {
            text_ids,
            all,
            format,
            output,
        } => cmd_export(&corpus, text_ids, all, format, output),
        Commands::Words {
            surface,
            gloss,
            pos,
            language,
            morpheme,
            offset,
            limit,
        } => cmd_words(
            &corpus,
            WordQuery {
                surface_form: surface,
                gloss,
                pos,
                language,
                contains_morpheme: morpheme,
                limit,
                offset,
            },
        ),
        Commands::Morphemes {
            surface,
            citation,
            gloss,
            morpheme_type,
            language,
            offset,
            limit,
        } => cmd_morphemes(
            &corpus,
            MorphemeQuery {
                surface_form: surface,
                citation_form: citation,
                gloss,
                morpheme_type,
                language,
                limit,
                offset,
            },
        ),
        Commands::Texts {
            language,
            offset,
            limit,
        } => cmd_texts(&corpus, language, offset, limit),
        Commands::Stats => cmd_stats(&corpus),
        Commands::Wipe { yes } => cmd_wipe(&corpus, &cli.db, yes),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_ingest(corpus: &Corpus, db: &PathBuf, files: &[PathBuf]) -> Result<()> {
    anyhow::ensure!(!files.is_empty(), "no document files given");

    let mut processed = 0usize;
    let mut skipped: Vec<(String, String)> = Vec::new();

    for file in files {
        let contents = std::fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?;
        let documents = parse_documents(&contents)
            .with_context(|| format!("parsing {}", file.display()))?;

        for document in &documents {
            let outcome = corpus
                .ingest(document)
                .with_context(|| format!("ingesting text `{}`", document.id))?;
            processed += 1;
            if !outcome.was_created {
                skipped.push((
                    outcome.text_id.clone(),
                    document.title.clone().unwrap_or_else(|| outcome.text_id.clone()),
                ));
            }
        }
    }

    corpus
        .save(db)
        .with_context(|| format!("saving snapshot {}", db.display()))?;

    println!(
        "{} {} text(s) processed",
        "ok:".green().bold(),
        processed
    );
    if !skipped.is_empty() {
        println!(
            "{} {} text(s) already existed; structural content was kept as-is:",
            "note:".yellow().bold(),
            skipped.len()
        );
        for (id, title) in &skipped {
            println!("  - {} ({})", title, id.dimmed());
        }
    }
    Ok(())
}

/// Accept one document or an array of documents.
fn parse_documents(contents: &str) -> Result<Vec<InterlinearText>> {
    if let Ok(many) = serde_json::from_str::<Vec<InterlinearText>>(contents) {
        return Ok(many);
    }
    let one: InterlinearText = serde_json::from_str(contents)?;
    Ok(vec![one])
}

fn cmd_search(
    corpus: &Corpus,
    pattern: String,
    target: TargetArg,
    language: Option<String>,
    context: usize,
    limit: usize,
) -> Result<()> {
    let hits = corpus.search(&ConcordanceQuery {
        target: target.into(),
        pattern,
        language,
        context_size: context,
        limit,
    });

    if hits.is_empty() {
        println!("{}", "no matches".yellow());
        return Ok(());
    }

    for hit in &hits {
        let left = hit.left_context.join(" ");
        let right = hit.right_context.join(" ");
        let provenance = format!("{} §{} #{}", hit.text_title, hit.segnum, hit.word_index);
        println!(
            "{:>30}  {}  {:<30}  {}",
            left,
            hit.target.bold().cyan(),
            right,
            provenance.dimmed()
        );
        if !hit.glosses.is_empty() {
            println!("{:>30}  {}", "", hit.glosses.join("; ").italic().dimmed());
        }
    }
    println!("{} {} hit(s)", "ok:".green().bold(), hits.len());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_graph(
    corpus: &Corpus,
    text_id: Option<String>,
    word: Option<String>,
    morpheme: Option<String>,
    language: Option<String>,
    types: Option<String>,
    limit: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    let view = if let Some(word) = word {
        corpus.word_neighborhood(&word, language.as_deref())
    } else if let Some(morpheme) = morpheme {
        corpus.morpheme_neighborhood(&morpheme, language.as_deref())
    } else {
        let labels = types.as_deref().map(parse_labels).transpose()?;
        corpus.graph_view(&ViewOptions {
            text_id,
            language,
            labels,
            per_type_limit: limit,
        })
    };

    if let Some(message) = &view.message {
        eprintln!("{} {}", "note:".yellow().bold(), message);
    }

    let payload = serde_json::to_string_pretty(&view)?;
    write_or_print(output, &payload)?;
    eprintln!(
        "{} {} node(s), {} edge(s), {} dropped",
        "ok:".green().bold(),
        view.stats.node_count,
        view.stats.edge_count,
        view.stats.dropped_edge_count
    );
    Ok(())
}

fn parse_labels(types: &str) -> Result<Vec<NodeLabel>> {
    types
        .split(',')
        .map(|t| {
            NodeLabel::parse(t).ok_or_else(|| anyhow::anyhow!("unknown node type `{}`", t.trim()))
        })
        .collect()
}

fn cmd_export(
    corpus: &Corpus,
    text_ids: Vec<String>,
    all: bool,
    format: FormatArg,
    output: Option<PathBuf>,
) -> Result<()> {
    let ids = if all { corpus.text_ids() } else { text_ids };
    anyhow::ensure!(!ids.is_empty(), "nothing to export: pass --text-id or --all");

    let payload = match format {
        FormatArg::Flextext => corpus.export_flextext(&ids)?,
        FormatArg::Json => corpus.export_json(&ids)?,
    };
    write_or_print(output, &payload)?;
    eprintln!("{} exported {} text(s)", "ok:".green().bold(), ids.len());
    Ok(())
}

fn cmd_words(corpus: &Corpus, query: WordQuery) -> Result<()> {
    let page = corpus.search_words(&query);
    for word in &page.items {
        let gloss = if word.gloss.is_empty() {
            String::new()
        } else {
            format!("  '{}'", word.gloss)
        };
        println!(
            "{}{}  {}  {}",
            word.surface_form.bold(),
            gloss,
            word.pos.join(",").dimmed(),
            format!("({}, {} morpheme(s))", word.id, word.morpheme_count).dimmed()
        );
    }
    println!(
        "{} {} of {} word(s) (offset {})",
        "ok:".green().bold(),
        page.items.len(),
        page.total,
        page.offset
    );
    Ok(())
}

fn cmd_morphemes(corpus: &Corpus, query: MorphemeQuery) -> Result<()> {
    let page = corpus.search_morphemes(&query);
    for morpheme in &page.items {
        let gloss = if morpheme.gloss.is_empty() {
            String::new()
        } else {
            format!("  '{}'", morpheme.gloss)
        };
        println!(
            "{} [{}]{}  {}",
            morpheme.surface_form.bold(),
            morpheme.morpheme_type,
            gloss,
            format!("({})", morpheme.id).dimmed()
        );
    }
    println!(
        "{} {} of {} morpheme(s) (offset {})",
        "ok:".green().bold(),
        page.items.len(),
        page.total,
        page.offset
    );
    Ok(())
}

fn cmd_texts(
    corpus: &Corpus,
    language: Option<String>,
    offset: usize,
    limit: usize,
) -> Result<()> {
    let page = corpus.texts(language.as_deref(), offset, limit);
    if page.items.is_empty() {
        println!("{}", "no texts in corpus".yellow());
        return Ok(());
    }

    for text in &page.items {
        let title = if text.title.is_empty() {
            "(untitled)".to_string()
        } else {
            text.title.clone()
        };
        println!("{} {}", title.bold(), format!("({})", text.id).dimmed());
        println!(
            "    language: {}  sections: {}  words: {}  morphemes: {}",
            if text.language.is_empty() { "?" } else { &text.language },
            text.section_count,
            text.word_count,
            text.morpheme_count
        );
    }
    println!(
        "{} showing {} of {} (offset {})",
        "ok:".green().bold(),
        page.items.len(),
        page.total,
        page.offset
    );
    Ok(())
}

fn cmd_stats(corpus: &Corpus) -> Result<()> {
    let stats = corpus.stats();
    println!("texts:         {}", stats.texts);
    println!("sections:      {}", stats.sections);
    println!("phrases:       {}", stats.phrases);
    println!("words:         {}", stats.words);
    println!("morphemes:     {}", stats.morphemes);
    println!("glosses:       {}", stats.glosses);
    println!("relationships: {}", stats.relationships);
    Ok(())
}

fn cmd_wipe(corpus: &Corpus, db: &PathBuf, yes: bool) -> Result<()> {
    anyhow::ensure!(
        yes,
        "refusing to wipe without --yes (this permanently deletes all corpus data)"
    );

    let deleted = corpus.wipe();
    corpus.save(db)?;

    println!("{} corpus wiped", "ok:".green().bold());
    println!(
        "deleted: {} texts, {} sections, {} phrases, {} words, {} morphemes, {} glosses, {} relationships",
        deleted.texts,
        deleted.sections,
        deleted.phrases,
        deleted.words,
        deleted.morphemes,
        deleted.glosses,
        deleted.relationships
    );
    Ok(())
}

fn write_or_print(output: Option<PathBuf>, payload: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, payload)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("{} wrote {}", "ok:".green().bold(), path.display());
        }
        None => println!("{payload}"),
    }
    Ok(())
}
