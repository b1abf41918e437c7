use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::qa::DEFAULT_TOP_K;

#[derive(Parser, Debug)]
#[command(
    name = "clausewise",
    version,
    about = "Clause-by-clause plain-language analysis of legal documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Analyze(AnalyzeArgs),
    Ask(AskArgs),
    Status(StatusArgs),
    Purge(PurgeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(long, default_value = ".cache/clausewise")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub input: PathBuf,

    /// Document name used in clause ids; defaults to the input file stem.
    #[arg(long)]
    pub name: Option<String>,

    /// External summarizer, e.g. `--summarizer-cmd "llm-cli --json"`. Reads the prompt
    /// on stdin and prints a JSON summary. Without it the offline heuristic is used.
    #[arg(long)]
    pub summarizer_cmd: Option<String>,

    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Keep the analysis in memory for this run instead of the SQLite store.
    #[arg(long, default_value_t = false)]
    pub no_store: bool,

    #[arg(long, default_value_t = 200)]
    pub chunk_words: usize,

    #[arg(long, default_value_t = 500)]
    pub call_delay_ms: u64,

    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    #[arg(long, default_value_t = 1000)]
    pub initial_backoff_ms: u64,

    #[arg(long, default_value_t = 24)]
    pub retention_hours: i64,
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    #[arg(long, default_value = ".cache/clausewise")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub document_id: String,

    #[arg(long)]
    pub question: String,

    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// External answer generator; reads context and question on stdin.
    #[arg(long)]
    pub answer_cmd: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/clausewise")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PurgeArgs {
    #[arg(long, default_value = ".cache/clausewise")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Delete every stored analysis, not only expired ones.
    #[arg(long, default_value_t = false)]
    pub all: bool,
}
