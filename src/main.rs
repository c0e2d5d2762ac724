use std::{sync::Arc, time::Duration};

use clap::Parser;
use lexrag::{
    cli::{self, Cli, Command},
    config::Settings,
    corpus::{self, TxtDirLoader},
    corpus_dir::CorpusDir,
    error::{self, Error},
    evaluation,
    search,
    service::RetrievalService,
    shell::{self, ShellOptions},
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("LEXRAG_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match &cli.command {
        Command::Search(args) => cmd_search(&cli, args)?,
        Command::Status(args) => cmd_status(&cli, args)?,
        Command::Chunks(args) => cmd_chunks(&cli, args)?,
        Command::Eval(args) => cmd_eval(&cli, args)?,
        Command::Shell(args) => cmd_shell(&cli, args)?,
        Command::Completions(args) => args.generate(),
    }

    Ok(())
}

fn resolve(cli: &Cli) -> error::Result<(CorpusDir, Settings)> {
    let corpus_dir = CorpusDir::resolve(cli.corpus_dir.as_deref())?;
    let settings =
        Settings::resolve(cli.config.as_deref(), &corpus_dir.settings_file())?;
    Ok((corpus_dir, settings))
}

fn start_service(cli: &Cli) -> error::Result<(CorpusDir, RetrievalService)> {
    let (corpus_dir, settings) = resolve(cli)?;
    let service =
        RetrievalService::new(TxtDirLoader::new(corpus_dir.root()), settings);
    service.start()?;
    Ok((corpus_dir, service))
}

fn cmd_search(cli: &Cli, args: &cli::SearchArgs) -> error::Result<()> {
    let (_, service) = start_service(cli)?;
    let hits = service.query(&args.query, args.k)?;

    if args.json {
        search::format_json(&hits, &args.query, args.k, args.full)?;
    } else {
        search::format_human(&hits, args.full);
    }
    Ok(())
}

fn cmd_status(cli: &Cli, args: &cli::StatusArgs) -> error::Result<()> {
    let (corpus_dir, service) = start_service(cli)?;
    let status = service.status();
    let settings = service.settings();

    if args.json {
        let value = json!({
            "corpus_dir": corpus_dir.root().display().to_string(),
            "settings": settings,
            "index": status,
        });
        println!("{}", serde_json::to_string(&value)?);
    } else {
        println!("Corpus directory: {}", corpus_dir.root().display());
        println!(
            "Chunking: max {} chars, overlap {} chars",
            settings.chunking.max_chars, settings.chunking.overlap
        );
        println!("BM25: k1 = {}, b = {}", settings.bm25.k1, settings.bm25.b);
        println!("Documents: {}", status.document_count);
        println!("Chunks: {}", status.chunk_count);
        println!("Vocabulary: {} terms", status.vocabulary_size);
        println!(
            "Average chunk length: {:.1} tokens",
            status.average_chunk_length
        );
    }
    Ok(())
}

fn cmd_chunks(cli: &Cli, args: &cli::ChunksArgs) -> error::Result<()> {
    let (_, settings) = resolve(cli)?;
    let mut chunking = settings.chunking;
    if let Some(max_chars) = args.max_chars {
        chunking.max_chars = max_chars;
    }
    if let Some(overlap) = args.overlap {
        chunking.overlap = overlap;
    }
    if chunking.max_chars == 0 {
        return Err(Error::Config("--max-chars must be greater than zero".into()));
    }

    if !args.file.is_file() {
        return Err(Error::NotFound {
            kind: "file",
            name: args.file.display().to_string(),
        });
    }
    let bytes = std::fs::read(&args.file)?;
    let text = corpus::decode_dropping_invalid(&bytes);
    let chunks = chunking.chunk(text.trim());

    if args.json {
        let items: Vec<_> = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| {
                json!({
                    "index": index,
                    "chars": chunk.chars().count(),
                    "text": chunk,
                })
            })
            .collect();
        println!("{}", serde_json::to_string(&items)?);
    } else if chunks.is_empty() {
        println!("No chunks (file is empty).");
    } else {
        for (index, chunk) in chunks.iter().enumerate() {
            println!(
                "--- chunk {index} ({} chars) ---",
                chunk.chars().count()
            );
            println!("{chunk}");
        }
        println!("\n{} chunk(s)", chunks.len());
    }
    Ok(())
}

fn cmd_eval(cli: &Cli, args: &cli::EvalArgs) -> error::Result<()> {
    let questions = evaluation::load_questions(&args.questions)?;
    let (_, service) = start_service(cli)?;
    let report = evaluation::evaluate(&service, &questions, args.k)?;

    if args.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print!("{}", evaluation::render_report(&report));
    }
    Ok(())
}

fn cmd_shell(cli: &Cli, args: &cli::ShellArgs) -> error::Result<()> {
    let (corpus_dir, service) = start_service(cli)?;
    let status = service.status();
    eprintln!(
        "Serving {} chunk(s) from {}; type a query, :reindex, :status or :quit",
        status.chunk_count,
        corpus_dir.root().display()
    );

    shell::run_shell(Arc::new(service), ShellOptions {
        default_k: args.k,
        reindex_interval: args.reindex_interval.map(Duration::from_secs),
    })
}
