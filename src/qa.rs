use serde::Serialize;
use tracing::warn;

use crate::error::SummarizerError;
use crate::model::{Clause, DocumentAnalysis};
use crate::semantic::ClauseRanker;
use crate::summarizer::run_with_stdin;

pub const DEFAULT_TOP_K: usize = 3;

pub trait AnswerGenerator {
    fn generate(&mut self, question: &str, context: &str) -> Result<String, SummarizerError>;
}

/// Sends `Context:` and `Question:` blocks to an external program on stdin and uses
/// its trimmed stdout as the answer.
#[derive(Debug, Clone)]
pub struct CommandAnswerGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandAnswerGenerator {
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl AnswerGenerator for CommandAnswerGenerator {
    fn generate(&mut self, question: &str, context: &str) -> Result<String, SummarizerError> {
        let prompt = format!(
            "You are a legal assistant. Answer the question using only the clauses below and \
cite the clause ids you rely on.\n\nContext:\n{context}\n\nQuestion: {question}"
        );
        let answer = run_with_stdin(&self.program, &self.args, &prompt)?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(SummarizerError::Parse("empty answer".to_string()));
        }
        Ok(answer.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QaAnswer {
    pub question: String,
    pub answer: String,
    pub clause_ids: Vec<String>,
    pub generated: bool,
}

pub fn clause_context(clauses: &[&Clause]) -> String {
    clauses
        .iter()
        .map(|clause| {
            format!(
                "Clause {}:\n{}\nSummary: {}",
                clause.id, clause.original_text, clause.plain_english
            )
        })
        .collect::<Vec<String>>()
        .join("\n\n")
}

pub fn fallback_answer(question: &str, clause_ids: &[String]) -> String {
    format!(
        "Based on {}, the answer to your question '{question}' would involve analyzing the \
relevant legal provisions. Please refer to these clauses for more information.",
        clause_ids.join(", ")
    )
}

/// Ranks clauses against the question and asks the generator; a missing or failing
/// generator yields the fallback answer naming the retrieved clauses.
pub fn answer_question(
    analysis: &DocumentAnalysis,
    question: &str,
    ranker: &dyn ClauseRanker,
    generator: Option<&mut dyn AnswerGenerator>,
    top_k: usize,
) -> QaAnswer {
    let texts = analysis
        .clauses
        .iter()
        .map(|clause| clause.original_text.as_str())
        .collect::<Vec<&str>>();
    let relevant = ranker
        .rank(&texts, question, top_k.max(1))
        .into_iter()
        .filter_map(|index| analysis.clauses.get(index))
        .collect::<Vec<&Clause>>();
    let clause_ids = relevant
        .iter()
        .map(|clause| clause.id.clone())
        .collect::<Vec<String>>();

    if let Some(generator) = generator {
        if !relevant.is_empty() {
            match generator.generate(question, &clause_context(&relevant)) {
                Ok(answer) => {
                    return QaAnswer {
                        question: question.to_string(),
                        answer,
                        clause_ids,
                        generated: true,
                    };
                }
                Err(err) => warn!(error = %err, "answer generation failed, using fallback"),
            }
        }
    }

    QaAnswer {
        question: question.to_string(),
        answer: fallback_answer(question, &clause_ids),
        clause_ids,
        generated: false,
    }
}
