use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::{AnalysisConfig, ClauseAnalyzer};
use crate::cli::AnalyzeArgs;
use crate::commands::open_store;
use crate::extract::{
    ExtractedText, ExtractionBackend, PageCleanup, command_available, extract_text,
};
use crate::model::DocumentAnalysis;
use crate::store::{AnalysisStore, MemoryStore, StoredAnalysis};
use crate::summarizer::{
    CallStats, ChunkSummarizer, CommandSummarizer, ExternalCaller, HeuristicSummarizer,
    RetryPolicy,
};
use crate::util::{document_id_for, write_json_pretty};

#[derive(Debug, Serialize)]
struct ExtractionReport<'a> {
    source_path: String,
    backend: ExtractionBackend,
    page_count: usize,
    cleanup: &'a PageCleanup,
}

#[derive(Debug, Serialize)]
struct SummarizerReport {
    name: &'static str,
    calls: usize,
    attempts: usize,
    failures: usize,
}

#[derive(Debug, Serialize)]
struct AnalyzeReport<'a> {
    extraction: ExtractionReport<'a>,
    summarizer: SummarizerReport,
    analysis: &'a DocumentAnalysis,
}

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let input = args.input.as_path();
    if has_extension(input, "pdf") && !command_available("pdftotext") {
        bail!(
            "pdftotext is required to analyze {} but was not found on PATH",
            input.display()
        );
    }

    let extracted = extract_text(input)
        .with_context(|| format!("failed to extract text from {}", input.display()))?;
    let document_name = args.name.clone().unwrap_or_else(|| {
        input
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or("document")
            .to_string()
    });

    info!(
        input = %input.display(),
        document = %document_name,
        pages = extracted.page_count,
        chars = extracted.text.chars().count(),
        "starting analysis"
    );

    let config = AnalysisConfig {
        chunk_word_limit: args.chunk_words,
        ..AnalysisConfig::default()
    };
    let analyzer = ClauseAnalyzer::new(config)?;
    let mut caller = ExternalCaller::new(
        build_summarizer(args.summarizer_cmd.as_deref())?,
        RetryPolicy {
            max_attempts: args.max_attempts,
            initial_backoff: Duration::from_millis(args.initial_backoff_ms),
        },
        Duration::from_millis(args.call_delay_ms),
    );

    let analysis = match analyzer.analyze_document(&document_name, &extracted.text, &mut caller) {
        Ok(analysis) => analysis,
        Err(err) => {
            let mut failed = DocumentAnalysis::new(
                document_id_for(&extracted.text),
                document_name.clone(),
            );
            failed.abandon(err.to_string());
            let mut store =
                open_analysis_store(args.no_store, &args.cache_root, args.db_path.as_deref())?;
            persist(store.as_mut(), failed, args.retention_hours)?;
            return Err(err).with_context(|| format!("failed to analyze {}", input.display()));
        }
    };

    log_summary(&analysis, caller.stats());

    let report = AnalyzeReport {
        extraction: extraction_report(input, &extracted),
        summarizer: summarizer_report(caller.summarizer_name(), caller.stats()),
        analysis: &analysis,
    };
    match args.output.as_deref() {
        Some(path) => {
            write_json_pretty(path, &report)?;
            info!(path = %path.display(), "wrote analysis report");
        }
        None => {
            let mut output = io::BufWriter::new(io::stdout().lock());
            serde_json::to_writer_pretty(&mut output, &report)
                .context("failed to serialize analysis json output")?;
            writeln!(output)?;
            output.flush()?;
        }
    }

    let document_id = analysis.document_id.clone();
    let mut store = open_analysis_store(args.no_store, &args.cache_root, args.db_path.as_deref())?;
    persist(store.as_mut(), analysis, args.retention_hours)?;
    info!(
        document_id = %document_id,
        persistent = !args.no_store,
        retention_hours = args.retention_hours,
        "stored analysis"
    );

    Ok(())
}

fn build_summarizer(command_line: Option<&str>) -> Result<Box<dyn ChunkSummarizer>> {
    match command_line {
        Some(command_line) => {
            let summarizer = CommandSummarizer::from_command_line(command_line)
                .context("--summarizer-cmd must name a program")?;
            Ok(Box::new(summarizer))
        }
        None => Ok(Box::new(HeuristicSummarizer::new()?)),
    }
}

/// `--no-store` keeps the record in a process-local store that is dropped on exit.
fn open_analysis_store(
    no_store: bool,
    cache_root: &Path,
    db_path: Option<&Path>,
) -> Result<Box<dyn AnalysisStore>> {
    if no_store {
        return Ok(Box::new(MemoryStore::new()));
    }
    Ok(Box::new(open_store(cache_root, db_path)?))
}

fn persist(
    store: &mut dyn AnalysisStore,
    analysis: DocumentAnalysis,
    retention_hours: i64,
) -> Result<()> {
    let now = Utc::now();

    let purged = store
        .purge_expired(now)
        .context("failed to purge expired analyses")?;
    if purged > 0 {
        info!(purged, "purged expired analyses");
    }

    let record = StoredAnalysis::new(
        analysis,
        now,
        chrono::Duration::hours(retention_hours.max(0)),
    );
    store.put(record).context("failed to store analysis")?;
    Ok(())
}

fn log_summary(analysis: &DocumentAnalysis, stats: CallStats) {
    let Some(summary) = analysis.summary.as_ref() else {
        return;
    };

    info!(
        document_id = %analysis.document_id,
        kind = analysis.document_kind.as_str(),
        method = analysis.segmentation_method.as_deref().unwrap_or(""),
        clauses = analysis.clauses.len(),
        successful = analysis.counts.successful,
        failed = analysis.counts.failed,
        skipped = analysis.counts.skipped,
        high = summary.risk_distribution.high,
        medium = summary.risk_distribution.medium,
        low = summary.risk_distribution.low,
        average_confidence = summary.average_confidence,
        average_completeness = summary.average_completeness,
        summarizer_calls = stats.calls,
        summarizer_attempts = stats.attempts,
        "analysis summary"
    );

    if analysis.counts.failed > 0 {
        warn!(
            failed = analysis.counts.failed,
            summarizer_failures = stats.failures,
            "some clauses could not be summarized"
        );
    }
}

fn extraction_report<'a>(input: &Path, extracted: &'a ExtractedText) -> ExtractionReport<'a> {
    ExtractionReport {
        source_path: input.display().to_string(),
        backend: extracted.backend,
        page_count: extracted.page_count,
        cleanup: &extracted.cleanup,
    }
}

fn summarizer_report(name: &'static str, stats: CallStats) -> SummarizerReport {
    SummarizerReport {
        name,
        calls: stats.calls,
        attempts: stats.attempts,
        failures: stats.failures,
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|value| value.eq_ignore_ascii_case(extension))
}
