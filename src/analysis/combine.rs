use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;

use crate::error::CombineError;
use crate::model::{ChunkResult, RiskLevel};

const LEAD_INS: &[&str] = &["This means", "This clause", "This section", "The clause"];
const DEFAULT_CHUNK_CONFIDENCE: f64 = 0.8;
const MAX_KEY_AMOUNTS: usize = 2;

/// Merges per-chunk summaries of one clause into a single result.
#[derive(Debug)]
pub struct ChunkCombiner {
    concept: Regex,
    money: Regex,
    amount: Regex,
    digits: Regex,
    action: Regex,
}

impl ChunkCombiner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            concept: Regex::new(r"\$\d[\d,]*|\b\d+%?|\b(?:payment|fee|penalty|days?|months?)\b")
                .context("failed to compile concept regex")?,
            money: Regex::new(r"\$\d[\d,]*(?:\.\d{2})?")
                .context("failed to compile money regex")?,
            amount: Regex::new(
                r"\$\d[\d,]*(?:\.\d{2})?|\b\d+(?:\.\d+)?%|\b\d+\s*(?:days?|months?|years?)\b|\b\d+(?:\.\d+)?\b",
            )
            .context("failed to compile amount regex")?,
            digits: Regex::new(r"\d+").context("failed to compile digit regex")?,
            action: Regex::new(r"\b(?:must|will|pay|face|lose|required|charged)\b")
                .context("failed to compile action regex")?,
        })
    }

    pub fn combine(&self, chunks: Vec<ChunkResult>) -> Result<ChunkResult, CombineError> {
        if chunks.len() <= 1 {
            return chunks.into_iter().next().ok_or(CombineError::EmptyInput);
        }

        let mut accepted = Vec::<String>::new();
        let mut seen_concepts = HashSet::<String>::new();
        let mut seen_money = HashSet::<String>::new();

        for chunk in &chunks {
            let mut text = chunk.plain_english.trim();
            if !accepted.is_empty() {
                text = strip_lead_in(text);
            }
            if text.is_empty() {
                continue;
            }

            let lowered = text.to_lowercase();
            let concepts = self
                .concept
                .find_iter(&lowered)
                .map(|value| value.as_str().to_string())
                .collect::<Vec<String>>();
            let money = self.money_tokens(text);

            let repeats_concept = concepts.iter().any(|concept| seen_concepts.contains(concept));
            let introduces_money = money.iter().any(|amount| !seen_money.contains(amount));
            if repeats_concept && !introduces_money {
                continue;
            }

            accepted.push(text.to_string());
            seen_concepts.extend(concepts);
            seen_money.extend(money);
        }

        let mut plain_english = join_sentences(&accepted);

        let missing = self.missing_amounts(&chunks, &plain_english);
        if !missing.is_empty() {
            plain_english.push_str(&format!(" Key amounts: {}.", missing.join(", ")));
        }

        let risk = chunks
            .iter()
            .map(|chunk| chunk.risk)
            .fold(RiskLevel::Low, RiskLevel::higher);
        let confidence = chunks
            .iter()
            .map(|chunk| chunk.confidence.unwrap_or(DEFAULT_CHUNK_CONFIDENCE))
            .sum::<f64>()
            / chunks.len() as f64;

        Ok(ChunkResult {
            plain_english,
            user_impact: self.most_specific_impact(&chunks),
            risk,
            confidence: Some(confidence),
            reasoning: Some(format!("Combined from {} sections", chunks.len())),
        })
    }

    /// `2 * digit groups + action verbs`; the earliest impact wins ties.
    pub fn impact_specificity(&self, impact: &str) -> usize {
        let numbers = self.digits.find_iter(impact).count();
        let actions = self.action.find_iter(&impact.to_lowercase()).count();
        numbers * 2 + actions
    }

    fn most_specific_impact(&self, chunks: &[ChunkResult]) -> String {
        let mut best: Option<(usize, &str)> = None;
        for chunk in chunks {
            let score = self.impact_specificity(&chunk.user_impact);
            if best.is_none_or(|(best_score, _)| score > best_score) {
                best = Some((score, chunk.user_impact.as_str()));
            }
        }
        best.map(|(_, impact)| impact.to_string()).unwrap_or_default()
    }

    fn money_tokens(&self, text: &str) -> Vec<String> {
        self.money
            .find_iter(text)
            .map(|value| value.as_str().trim_end_matches(',').to_string())
            .collect()
    }

    /// Amounts quoted by any chunk that the combined text lost, monetary ones first.
    fn missing_amounts(&self, chunks: &[ChunkResult], combined: &str) -> Vec<String> {
        let mut money = Vec::<String>::new();
        let mut other = Vec::<String>::new();

        for chunk in chunks {
            for found in self.amount.find_iter(&chunk.plain_english) {
                let token = found.as_str().trim_end_matches(',').to_string();
                if token.starts_with('$') {
                    money.push(token);
                } else {
                    other.push(token);
                }
            }
        }

        let mut seen = HashSet::<String>::new();
        money
            .into_iter()
            .chain(other)
            .filter(|token| !combined.contains(token.as_str()))
            .filter(|token| seen.insert(token.clone()))
            .take(MAX_KEY_AMOUNTS)
            .collect()
    }
}

fn strip_lead_in(text: &str) -> &str {
    for lead_in in LEAD_INS {
        if let Some(rest) = text.strip_prefix(lead_in) {
            let rest = rest.trim_start();
            return rest.strip_prefix("that").map(str::trim_start).unwrap_or(rest);
        }
    }
    text
}

fn join_sentences(sentences: &[String]) -> String {
    match sentences {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} Additionally, {}", second.to_lowercase()),
        [first, rest @ ..] => format!(
            "{first} Also, {}",
            rest.iter()
                .map(|sentence| sentence.to_lowercase())
                .collect::<Vec<String>>()
                .join(" and ")
        ),
    }
}
