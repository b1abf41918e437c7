use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn priority(self) -> u32 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Lenient parse used for generated responses; unknown labels fall back to Medium.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn higher(self, other: Self) -> Self {
        if other.priority() > self.priority() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseType {
    Payment,
    Termination,
    Liability,
    Property,
    Duration,
    Obligations,
    Rights,
    Restrictions,
    Default,
    Remedies,
    Insurance,
    Maintenance,
    Confidentiality,
    General,
}

impl ClauseType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Termination => "termination",
            Self::Liability => "liability",
            Self::Property => "property",
            Self::Duration => "duration",
            Self::Obligations => "obligations",
            Self::Rights => "rights",
            Self::Restrictions => "restrictions",
            Self::Default => "default",
            Self::Remedies => "remedies",
            Self::Insurance => "insurance",
            Self::Maintenance => "maintenance",
            Self::Confidentiality => "confidentiality",
            Self::General => "general",
        }
    }
}

impl fmt::Display for ClauseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Rental,
    Loan,
    TermsOfService,
    Nda,
    Employment,
    Vendor,
    Insurance,
    Consent,
    Unknown,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rental => "rental",
            Self::Loan => "loan",
            Self::TermsOfService => "terms_of_service",
            Self::Nda => "nda",
            Self::Employment => "employment",
            Self::Vendor => "vendor",
            Self::Insurance => "insurance",
            Self::Consent => "consent",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clause {
    pub id: String,
    pub ordinal: usize,
    pub number: Option<String>,
    pub heading: Option<String>,
    pub original_text: String,
    pub plain_english: String,
    pub user_impact: String,
    pub word_count: usize,
    pub contains_numbers: bool,
    pub contains_dates: bool,
    pub contains_financial: bool,
    pub clause_type: ClauseType,
    #[serde(default)]
    pub key_entities: Vec<String>,
    #[serde(default)]
    pub numeric_obligations: Vec<String>,
    #[serde(default)]
    pub conditional_language: Vec<String>,
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    pub risk_reason: String,
    pub confidence_score: f64,
    pub completeness_score: f64,
    pub processing: ProcessingMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub original_word_count: usize,
    pub cleaned_word_count: usize,
    pub cleaning_ratio: f64,
    pub has_numeric_obligations: bool,
    pub has_conditional_language: bool,
    pub chunk_count: usize,
    pub chunks_failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskFactor {
    Keyword { keyword: String, weight: u32 },
    Numeric { obligation: String, value: f64, tier: RiskLevel, bonus: u32 },
    Conditional { count: usize, contribution: u32 },
    ExternalOverride { level: RiskLevel },
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword { keyword, weight } => write!(f, "{keyword}({weight})"),
            Self::Numeric {
                obligation,
                value,
                bonus,
                ..
            } => write!(f, "numeric:{obligation}:{value}({bonus})"),
            Self::Conditional {
                count,
                contribution,
            } => write!(f, "conditionals:{count}({contribution})"),
            Self::ExternalOverride { level } => write!(f, "external_override:{level}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub factors: Vec<RiskFactor>,
    pub level: RiskLevel,
    pub confidence: f64,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkResult {
    pub plain_english: String,
    pub user_impact: String,
    pub risk: RiskLevel,
    pub confidence: Option<f64>,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    InProgress,
    Complete,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProcessingCounts {
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ProcessingCounts {
    pub fn total(&self) -> usize {
        self.successful + self.failed + self.skipped
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskDistribution {
    #[serde(rename = "High")]
    pub high: usize,
    #[serde(rename = "Medium")]
    pub medium: usize,
    #[serde(rename = "Low")]
    pub low: usize,
}

impl RiskDistribution {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub risk_distribution: RiskDistribution,
    pub clause_types: BTreeMap<String, usize>,
    pub numeric_obligations_found: usize,
    pub conditional_clauses: usize,
    pub average_completeness: f64,
    pub average_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    pub total_entities_found: usize,
    pub avg_entities_per_clause: f64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub document_id: String,
    pub document_name: String,
    pub document_kind: DocumentKind,
    pub status: AnalysisStatus,
    pub segmentation_method: Option<String>,
    pub clauses: Vec<Clause>,
    pub counts: ProcessingCounts,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub summary: Option<DocumentSummary>,
}

impl DocumentAnalysis {
    pub fn new(document_id: String, document_name: String) -> Self {
        Self {
            document_id,
            document_name,
            document_kind: DocumentKind::Unknown,
            status: AnalysisStatus::InProgress,
            segmentation_method: None,
            clauses: Vec::new(),
            counts: ProcessingCounts::default(),
            failure_reason: None,
            created_at: Utc::now(),
            completed_at: None,
            summary: None,
        }
    }

    pub fn record_clause(&mut self, clause: Clause) {
        self.counts.successful += 1;
        self.clauses.push(clause);
    }

    pub fn record_failure(&mut self) {
        self.counts.failed += 1;
    }

    pub fn record_skip(&mut self) {
        self.counts.skipped += 1;
    }

    pub fn finalize(&mut self) {
        self.summary = Some(summarize_clauses(&self.clauses, &self.counts));
        self.status = AnalysisStatus::Complete;
        self.completed_at = Some(Utc::now());
    }

    pub fn abandon(&mut self, reason: impl Into<String>) {
        self.clauses.clear();
        self.summary = None;
        self.status = AnalysisStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.completed_at = Some(Utc::now());
    }

    pub fn clause(&self, clause_id: &str) -> Option<&Clause> {
        self.clauses.iter().find(|clause| clause.id == clause_id)
    }
}

fn summarize_clauses(clauses: &[Clause], counts: &ProcessingCounts) -> DocumentSummary {
    let mut summary = DocumentSummary::default();

    for clause in clauses {
        summary.risk_distribution.record(clause.risk_level);
        *summary
            .clause_types
            .entry(clause.clause_type.as_str().to_string())
            .or_insert(0) += 1;
        summary.numeric_obligations_found += clause.numeric_obligations.len();
        if !clause.conditional_language.is_empty() {
            summary.conditional_clauses += 1;
        }
        summary.total_entities_found += clause.key_entities.len();
    }

    if !clauses.is_empty() {
        let count = clauses.len() as f64;
        summary.average_completeness = clauses
            .iter()
            .map(|clause| clause.completeness_score)
            .sum::<f64>()
            / count;
        summary.average_confidence = clauses
            .iter()
            .map(|clause| clause.confidence_score)
            .sum::<f64>()
            / count;
        summary.min_confidence = clauses
            .iter()
            .map(|clause| clause.confidence_score)
            .fold(f64::INFINITY, f64::min);
        summary.max_confidence = clauses
            .iter()
            .map(|clause| clause.confidence_score)
            .fold(f64::NEG_INFINITY, f64::max);
        summary.avg_entities_per_clause = summary.total_entities_found as f64 / count;
    }

    let total = counts.total();
    if total > 0 {
        summary.success_rate = counts.successful as f64 / total as f64;
    }

    summary
}
