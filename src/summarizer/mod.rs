use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::SummarizerError;
use crate::model::{ChunkResult, ClauseType, RiskLevel};

mod command;
mod heuristic;
#[cfg(test)]
mod tests;

pub use command::CommandSummarizer;
pub(crate) use command::run_with_stdin;
pub use heuristic::HeuristicSummarizer;

const PROMPT_MAX_HINTS: usize = 3;

/// One chunk of clause text plus the hints extracted from it.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub text: &'a str,
    pub clause_type: Option<ClauseType>,
    pub entities: &'a [String],
    pub obligations: &'a [String],
}

pub trait ChunkSummarizer {
    fn name(&self) -> &'static str;
    fn summarize_chunk(&mut self, request: &SummaryRequest<'_>)
    -> Result<ChunkResult, SummarizerError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay after the zero-based `attempt` failed.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(1_u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CallStats {
    pub calls: usize,
    pub attempts: usize,
    pub failures: usize,
}

/// Wraps a summarizer with a fixed delay between calls and retry with exponential
/// backoff. A call that exhausts its attempts yields no result.
pub struct ExternalCaller {
    summarizer: Box<dyn ChunkSummarizer>,
    retry: RetryPolicy,
    call_delay: Duration,
    last_call: Option<Instant>,
    stats: CallStats,
}

impl ExternalCaller {
    pub fn new(
        summarizer: Box<dyn ChunkSummarizer>,
        retry: RetryPolicy,
        call_delay: Duration,
    ) -> Self {
        Self {
            summarizer,
            retry,
            call_delay,
            last_call: None,
            stats: CallStats::default(),
        }
    }

    pub fn summarizer_name(&self) -> &'static str {
        self.summarizer.name()
    }

    pub fn stats(&self) -> CallStats {
        self.stats
    }

    pub fn call(&mut self, request: &SummaryRequest<'_>) -> Option<ChunkResult> {
        self.stats.calls += 1;
        let max_attempts = self.retry.max_attempts.max(1);

        for attempt in 0..max_attempts {
            self.wait_for_slot();
            self.stats.attempts += 1;

            match self.summarizer.summarize_chunk(request) {
                Ok(result) => {
                    if attempt > 0 {
                        info!(attempt = attempt + 1, "summarizer call succeeded after retry");
                    }
                    return Some(result);
                }
                Err(err) => {
                    if attempt + 1 < max_attempts {
                        let delay = self.retry.backoff_for(attempt);
                        warn!(
                            error = %err,
                            attempt = attempt + 1,
                            max_attempts = max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            "summarizer call failed, retrying"
                        );
                        sleep_for(delay);
                    } else {
                        warn!(error = %err, attempts = max_attempts, "summarizer call gave up");
                    }
                }
            }
        }

        self.stats.failures += 1;
        None
    }

    fn wait_for_slot(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.call_delay {
                let remaining = self.call_delay - elapsed;
                debug!(delay_ms = remaining.as_millis() as u64, "pacing summarizer call");
                sleep_for(remaining);
            }
        }
        self.last_call = Some(Instant::now());
    }
}

fn sleep_for(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

pub fn build_prompt(request: &SummaryRequest<'_>) -> String {
    let context = match request.clause_type {
        Some(clause_type) if clause_type != ClauseType::General => {
            format!("Clause type: {clause_type}")
        }
        _ => "General legal clause".to_string(),
    };
    let numbers = join_hints(request.entities);
    let requirements = join_hints(request.obligations);

    format!(
        "You are a legal expert explaining a contract clause so a non-lawyer understands \
their obligations and risks.

CONTEXT: {context}
NUMBERS FOUND: {numbers}
REQUIREMENTS: {requirements}

INSTRUCTIONS:
1. PLAIN ENGLISH: write one or two clear sentences in simple words.
2. HIGHLIGHT NUMBERS: include every amount, percentage, deadline and timeframe.
3. USER IMPACT: say what the reader must do or what could happen to them.
4. RISK LEVEL: High (serious consequences), Medium (moderate impact) or Low (minor impact).

Legal clause: \"{text}\"

Respond ONLY with JSON of this shape:
{{
  \"plain_english\": \"...\",
  \"user_impact\": \"...\",
  \"risk\": \"High|Medium|Low\",
  \"reasoning\": \"...\",
  \"confidence\": 0.9
}}",
        text = request.text,
    )
}

fn join_hints(hints: &[String]) -> String {
    hints
        .iter()
        .take(PROMPT_MAX_HINTS)
        .map(String::as_str)
        .collect::<Vec<&str>>()
        .join(", ")
}

#[derive(Debug, Deserialize)]
struct RawSummary {
    plain_english: String,
    user_impact: String,
    risk: String,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Accepts fenced or chatty output as long as it contains one JSON object with the
/// required fields.
pub fn parse_summary_response(response: &str) -> Result<ChunkResult, SummarizerError> {
    let cleaned = response.replace("```json", "").replace("```", "");
    let start = cleaned
        .find('{')
        .ok_or_else(|| SummarizerError::Parse("no JSON object in response".to_string()))?;
    let end = cleaned
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| SummarizerError::Parse("unterminated JSON object".to_string()))?;

    let raw: RawSummary = serde_json::from_str(&cleaned[start..=end])
        .map_err(|err| SummarizerError::Parse(err.to_string()))?;

    if raw.plain_english.trim().is_empty() {
        return Err(SummarizerError::Parse("empty plain_english".to_string()));
    }

    Ok(ChunkResult {
        plain_english: raw.plain_english.trim().to_string(),
        user_impact: raw.user_impact.trim().to_string(),
        risk: RiskLevel::from_label(&raw.risk),
        confidence: raw.confidence.map(|value| value.clamp(0.0, 1.0)),
        reasoning: raw.reasoning,
    })
}
