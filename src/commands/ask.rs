use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::info;

use crate::cli::AskArgs;
use crate::commands::open_store;
use crate::model::{AnalysisStatus, DocumentAnalysis};
use crate::qa::{AnswerGenerator, CommandAnswerGenerator, QaAnswer, answer_question};
use crate::semantic::LocalHashRanker;
use crate::store::AnalysisStore;

pub fn run(args: AskArgs) -> Result<()> {
    let store = open_store(&args.cache_root, args.db_path.as_deref())?;
    let Some(record) = store
        .get(&args.document_id)
        .context("failed to load stored analysis")?
    else {
        bail!("no stored analysis for document id {}", args.document_id);
    };

    if record.is_expired(Utc::now()) {
        bail!(
            "analysis {} expired at {}; analyze the document again",
            args.document_id,
            record.expires_at
        );
    }
    if record.analysis.status != AnalysisStatus::Complete {
        bail!(
            "analysis {} is {}: {}",
            args.document_id,
            record.analysis.status.as_str(),
            record.analysis.failure_reason.as_deref().unwrap_or("no clauses")
        );
    }

    let mut generator = match args.answer_cmd.as_deref() {
        Some(command_line) => Some(
            CommandAnswerGenerator::from_command_line(command_line)
                .context("--answer-cmd must name a program")?,
        ),
        None => None,
    };

    let ranker = LocalHashRanker::default();
    let answer = answer_question(
        &record.analysis,
        &args.question,
        &ranker,
        generator
            .as_mut()
            .map(|generator| generator as &mut dyn AnswerGenerator),
        args.top_k,
    );

    info!(
        document_id = %args.document_id,
        clauses = %answer.clause_ids.join(","),
        generated = answer.generated,
        "answered question"
    );

    if args.json {
        write_json_answer(&answer)
    } else {
        write_text_answer(&record.analysis, &answer)
    }
}

fn write_json_answer(answer: &QaAnswer) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, answer).context("failed to serialize answer json")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_answer(analysis: &DocumentAnalysis, answer: &QaAnswer) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Question: {}", answer.question)?;
    writeln!(output, "Answer: {}", answer.answer)?;
    writeln!(output, "Clauses:")?;
    for clause_id in &answer.clause_ids {
        let heading = analysis
            .clause(clause_id)
            .and_then(|clause| clause.heading.as_deref())
            .unwrap_or("");
        writeln!(output, "  {clause_id}  {heading}")?;
    }
    output.flush()?;
    Ok(())
}
