use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::bm25::DEFAULT_TOP_K;

#[derive(Debug, Parser)]
#[command(
    name = "lexrag",
    about = "In-memory BM25 retrieval over a directory of text documents"
)]
pub struct Cli {
    /// Directory of .txt documents (overrides LEXRAG_CORPUS_DIR)
    #[arg(long, global = true)]
    pub corpus_dir: Option<PathBuf>,

    /// Settings file (defaults to <corpus-dir>/lexrag.json if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search the corpus
    Search(SearchArgs),
    /// Show the resolved corpus, settings and index statistics
    Status(StatusArgs),
    /// Show how a single file is split into chunks
    Chunks(ChunksArgs),
    /// Measure retrieval hit@k over a JSONL question set
    Eval(EvalArgs),
    /// Answer queries from stdin, one JSON line per query
    Shell(ShellArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Number of results to return (at least one is always returned)
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub k: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Print whole chunks instead of previews
    #[arg(long)]
    pub full: bool,
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Chunks --

#[derive(Debug, Parser)]
pub struct ChunksArgs {
    /// File to chunk
    pub file: PathBuf,

    /// Override the maximum chunk size in characters
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Override the overlap in characters
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Eval --

#[derive(Debug, Parser)]
pub struct EvalArgs {
    /// JSONL file of {"id", "question", "doc_hint"} objects
    pub questions: PathBuf,

    /// Number of results considered per question
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub k: usize,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Shell --

#[derive(Debug, Parser)]
pub struct ShellArgs {
    /// Default number of results per query
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub k: usize,

    /// Reindex in the background every N seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub reindex_interval: Option<u64>,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "lexrag",
            &mut std::io::stdout(),
        );
    }
}
