use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::model::ClauseType;

const CLAUSE_TYPE_PATTERNS: &[(ClauseType, &str)] = &[
    (
        ClauseType::Payment,
        r"\b(?:pay|pays|paid|payment|payments|payable|rent|rents|fee|fees|charge|charges|cost|costs|price|amount|amounts|due|owing)\b",
    ),
    (
        ClauseType::Termination,
        r"\b(?:terminat\w*|end|ends|ended|cancel\w*|expire|expires|expiry|expiration|dissolution|breach\w*)\b",
    ),
    (
        ClauseType::Liability,
        r"\b(?:liable|liability|responsible|damages|loss|losses|harm|injury|injuries)\b",
    ),
    (
        ClauseType::Property,
        r"\b(?:property|premises|real estate|land|building|unit)\b",
    ),
    (
        ClauseType::Duration,
        r"\b(?:term|terms|duration|period|periods|months?|years?|days?|time)\b",
    ),
    (
        ClauseType::Obligations,
        r"\b(?:shall|must|required|obligations?|duty|duties|responsibility)\b",
    ),
    (
        ClauseType::Rights,
        r"\b(?:rights?|entitled?|may|permit|permitted|allow|allowed)\b",
    ),
    (
        ClauseType::Restrictions,
        r"\b(?:not|cannot|shall not|prohibited|forbidden|restrict\w*)\b",
    ),
    (
        ClauseType::Default,
        r"\b(?:default|defaults|fail|fails|failure|breach|violation|non-compliance)\b",
    ),
    (
        ClauseType::Remedies,
        r"\b(?:remedy|remedies|cure|notice|evict\w*|sue|legal action)\b",
    ),
    (
        ClauseType::Insurance,
        r"\b(?:insurance|insure|insured|coverage|policy|claims?)\b",
    ),
    (
        ClauseType::Maintenance,
        r"\b(?:maintain|maintenance|repairs?|upkeep|condition|care)\b",
    ),
    (
        ClauseType::Confidentiality,
        r"\b(?:confidential|confidentiality|secret|proprietary|non-disclosure)\b",
    ),
];

const ENTITY_PATTERNS: &[(&str, &str)] = &[
    ("money", r"\$[\d,]+(?:\.\d{2})?"),
    ("percentage", r"\b\d+(?:\.\d+)?%"),
    ("timeframe", r"(?i)\b\d+\s*(?:days?|weeks?|months?|years?|hours?)\b"),
    ("dates", r"\b\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}\b"),
    ("late_fees", r"(?i)\blate\s+fee\s+of\s+\$?\d+(?:,\d{3})*(?:\.\d+)?%?"),
    ("penalties", r"(?i)\bpenalty\s+of\s+\$?\d+(?:,\d{3})*(?:\.\d+)?%?"),
];

const NUMERIC_OBLIGATION_PATTERNS: &[(&str, &str)] = &[
    ("percentage", r"\b\d+(?:\.\d+)?%"),
    ("money", r"\$[\d,]+(?:\.\d{2})?"),
    ("days", r"(?i)\b\d+\s*days?\b"),
    ("months", r"(?i)\b\d+\s*months?\b"),
    ("years", r"(?i)\b\d+\s*years?\b"),
    ("hours", r"(?i)\b\d+\s*hours?\b"),
    (
        "late_fee",
        r"(?i)\b(?:late\s+fee|penalty)\s+of\s+\$?\d+(?:,\d{3})*(?:\.\d+)?%?",
    ),
    ("interest_rate", r"(?i)\b\d+(?:\.\d+)?%\s*(?:interest|rate)"),
];

const CONDITIONAL_MARKERS: &[&str] = &[
    "unless",
    "subject to",
    "if",
    "then",
    "provided that",
    "in the event",
    "when",
    "should",
    "may",
    "condition",
];

const MAX_ENTITIES_PER_TYPE: usize = 3;
const HEADING_MAX_CHARS: usize = 80;
const HEADING_MAX_WORDS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClauseFeatures {
    pub clause_type: ClauseType,
    pub entities: Vec<String>,
    pub numeric_obligations: Vec<String>,
    pub conditional_language: Vec<String>,
    pub contains_numbers: bool,
    pub contains_dates: bool,
    pub contains_financial: bool,
}

#[derive(Debug)]
pub struct FeatureExtractor {
    clause_types: Vec<(ClauseType, Regex)>,
    entities: Vec<(&'static str, Regex)>,
    obligations: Vec<(&'static str, Regex)>,
    conditionals: Vec<(&'static str, Regex)>,
    date: Regex,
    financial: Regex,
    headings: Vec<Regex>,
}

fn compile_table<K: Copy>(table: &[(K, &str)], what: &str) -> Result<Vec<(K, Regex)>> {
    table
        .iter()
        .map(|(key, pattern)| {
            Regex::new(pattern)
                .with_context(|| format!("failed to compile {what} regex {pattern}"))
                .map(|regex| (*key, regex))
        })
        .collect()
}

impl FeatureExtractor {
    pub fn new() -> Result<Self> {
        let conditionals = CONDITIONAL_MARKERS
            .iter()
            .map(|marker| {
                let pattern = format!(r"(?i)\b{}\b", marker.replace(' ', r"\s+"));
                Regex::new(&pattern)
                    .with_context(|| format!("failed to compile conditional regex {pattern}"))
                    .map(|regex| (*marker, regex))
            })
            .collect::<Result<Vec<_>>>()?;

        let headings = [
            r"^\d+\.?\s*[\-:]?\s*[A-Z]",
            r"(?i)^section\s+\d+",
            r"(?i)^article\s+[ivx\d]+",
            r"^\([a-zA-Z0-9]+\)",
            r"^\w\.\s+[A-Z]",
            r"^\d+\.\d+\s+[A-Z]",
        ]
        .iter()
        .map(|pattern| {
            Regex::new(pattern).with_context(|| format!("failed to compile heading regex {pattern}"))
        })
        .collect::<Result<Vec<Regex>>>()?;

        Ok(Self {
            clause_types: compile_table(CLAUSE_TYPE_PATTERNS, "clause type")?,
            entities: compile_table(ENTITY_PATTERNS, "entity")?,
            obligations: compile_table(NUMERIC_OBLIGATION_PATTERNS, "numeric obligation")?,
            conditionals,
            date: Regex::new(r"\b\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}\b")
                .context("failed to compile date regex")?,
            financial: Regex::new(r"(?i)\$|\b(?:dollars?|cents?|payment|fee|cost)\b")
                .context("failed to compile financial regex")?,
            headings,
        })
    }

    pub fn extract(&self, text: &str) -> ClauseFeatures {
        ClauseFeatures {
            clause_type: self.classify(text),
            entities: self.entities(text),
            numeric_obligations: self.numeric_obligations(text),
            conditional_language: self.conditional_language(text),
            contains_numbers: text.chars().any(|character| character.is_ascii_digit()),
            contains_dates: self.date.is_match(text),
            contains_financial: self.financial.is_match(text),
        }
    }

    /// Highest match count wins; ties go to the earlier table entry.
    pub fn classify(&self, text: &str) -> ClauseType {
        let lowered = text.to_lowercase();
        let mut best = ClauseType::General;
        let mut best_count = 0usize;

        for (clause_type, pattern) in &self.clause_types {
            let count = pattern.find_iter(&lowered).count();
            if count > best_count {
                best = *clause_type;
                best_count = count;
            }
        }

        best
    }

    pub fn entities(&self, text: &str) -> Vec<String> {
        let mut found = Vec::new();
        for (label, pattern) in &self.entities {
            found.extend(
                pattern
                    .find_iter(text)
                    .take(MAX_ENTITIES_PER_TYPE)
                    .map(|value| format!("{label}: {}", value.as_str())),
            );
        }
        found
    }

    pub fn numeric_obligations(&self, text: &str) -> Vec<String> {
        let mut found = Vec::new();
        for (label, pattern) in &self.obligations {
            found.extend(
                pattern
                    .find_iter(text)
                    .map(|value| format!("{label}: {}", value.as_str())),
            );
        }
        found
    }

    /// Markers present in the text, lower-case, in table order.
    pub fn conditional_language(&self, text: &str) -> Vec<String> {
        self.conditionals
            .iter()
            .filter(|(_, pattern)| pattern.is_match(text))
            .map(|(marker, _)| marker.to_string())
            .collect()
    }

    pub fn extract_heading(&self, text: &str) -> Option<String> {
        let first_line = text.lines().map(str::trim).find(|line| !line.is_empty())?;

        if self.headings.iter().any(|pattern| pattern.is_match(first_line)) {
            return Some(first_line.to_string());
        }

        let short_caps = first_line.chars().count() < HEADING_MAX_CHARS
            && first_line.split_whitespace().count() <= HEADING_MAX_WORDS
            && first_line.chars().any(char::is_uppercase)
            && !first_line.chars().any(char::is_lowercase);
        short_caps.then(|| first_line.to_string())
    }
}
