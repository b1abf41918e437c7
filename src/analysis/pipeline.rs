use anyhow::Result;
use tracing::{debug, info, warn};

use crate::error::AnalysisError;
use crate::model::{Clause, DocumentAnalysis, ProcessingMetadata};
use crate::summarizer::{ExternalCaller, SummaryRequest};
use crate::util::document_id_for;

use super::{
    AnalysisConfig, ChunkCombiner, ClauseSegmenter, FeatureExtractor, PlainLanguage, RawSegment,
    RiskScorer, TextNormalizer, assign_clause_ids, chunk_text, detect_document_kind,
    display_title, word_count,
};

const DEFAULT_SUMMARY_CONFIDENCE: f64 = 0.8;
const MIN_SUMMARY_WORD_BASE: f64 = 5.0;
const SUMMARY_LENGTH_RATIO: f64 = 0.1;

#[derive(Debug)]
pub enum ClauseOutcome {
    Analyzed(Box<Clause>),
    Skipped(String),
    Failed(String),
}

/// Runs a document through normalization, segmentation and per-clause summarization.
pub struct ClauseAnalyzer {
    config: AnalysisConfig,
    normalizer: TextNormalizer,
    segmenter: ClauseSegmenter,
    features: FeatureExtractor,
    scorer: RiskScorer,
    combiner: ChunkCombiner,
    plain_language: PlainLanguage,
}

impl ClauseAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Ok(Self {
            config,
            normalizer: TextNormalizer::new()?,
            segmenter: ClauseSegmenter::new()?,
            features: FeatureExtractor::new()?,
            scorer: RiskScorer::new()?,
            combiner: ChunkCombiner::new()?,
            plain_language: PlainLanguage::new()?,
        })
    }

    pub fn analyze_document(
        &self,
        document_name: &str,
        raw: &str,
        caller: &mut ExternalCaller,
    ) -> Result<DocumentAnalysis, AnalysisError> {
        let meaningful_chars = raw
            .chars()
            .filter(|character| !character.is_whitespace())
            .count();
        if meaningful_chars < self.config.min_document_chars {
            return Err(AnalysisError::Input(format!(
                "document has {meaningful_chars} non-whitespace characters, need at least {}",
                self.config.min_document_chars
            )));
        }

        let normalized = self.normalizer.normalize(raw);
        let document_kind = detect_document_kind(document_name, &normalized);
        let segmentation = self.segmenter.segment(&normalized)?;
        info!(
            document = document_name,
            kind = document_kind.as_str(),
            method = segmentation.method,
            segments = segmentation.segments.len(),
            "segmented document"
        );

        let mut analysis = DocumentAnalysis::new(document_id_for(raw), document_name.to_string());
        analysis.document_kind = document_kind;
        analysis.segmentation_method = Some(segmentation.method.to_string());

        let clause_ids = assign_clause_ids(document_name, &segmentation.segments);
        for (index, (segment, clause_id)) in segmentation
            .segments
            .iter()
            .zip(clause_ids)
            .enumerate()
        {
            match self.analyze_clause(clause_id, index + 1, segment, caller) {
                ClauseOutcome::Analyzed(clause) => analysis.record_clause(*clause),
                ClauseOutcome::Skipped(reason) => {
                    debug!(ordinal = index + 1, reason = %reason, "clause skipped");
                    analysis.record_skip();
                }
                ClauseOutcome::Failed(reason) => {
                    warn!(ordinal = index + 1, reason = %reason, "clause failed");
                    analysis.record_failure();
                }
            }
        }

        analysis.finalize();
        info!(
            document = document_name,
            successful = analysis.counts.successful,
            failed = analysis.counts.failed,
            skipped = analysis.counts.skipped,
            "document analysis complete"
        );
        Ok(analysis)
    }

    pub fn analyze_clause(
        &self,
        clause_id: String,
        ordinal: usize,
        segment: &RawSegment,
        caller: &mut ExternalCaller,
    ) -> ClauseOutcome {
        let cleaned = self.normalizer.normalize(&segment.body);
        let cleaned_chars = cleaned.trim().chars().count();
        if cleaned_chars < self.config.min_clause_chars {
            return ClauseOutcome::Skipped(
                AnalysisError::Input(format!(
                    "clause text has {cleaned_chars} characters after cleaning"
                ))
                .to_string(),
            );
        }

        let cleaned_words = word_count(&cleaned);
        if cleaned_words < self.config.boilerplate_clause_words
            && self.normalizer.is_boilerplate(&cleaned)
        {
            return ClauseOutcome::Skipped("clause is boilerplate".to_string());
        }

        let features = self.features.extract(&cleaned);
        let chunks = if cleaned_words <= self.config.chunk_word_limit {
            vec![cleaned.clone()]
        } else {
            chunk_text(&cleaned, self.config.chunk_word_limit)
        };
        if chunks.len() > 1 {
            info!(clause = %clause_id, chunks = chunks.len(), "summarizing clause in chunks");
        }

        let mut results = Vec::with_capacity(chunks.len());
        let mut chunks_failed = 0usize;
        for chunk in &chunks {
            let chunk_features;
            let (entities, obligations) = if chunks.len() == 1 {
                (&features.entities, &features.numeric_obligations)
            } else {
                chunk_features = self.features.extract(chunk);
                (&chunk_features.entities, &chunk_features.numeric_obligations)
            };
            let request = SummaryRequest {
                text: chunk,
                clause_type: Some(features.clause_type),
                entities,
                obligations,
            };
            match caller.call(&request) {
                Some(result) => results.push(result),
                None => chunks_failed += 1,
            }
        }

        if results.is_empty() {
            return ClauseOutcome::Failed(format!("all {} summarizer calls failed", chunks.len()));
        }

        let combined = match self.combiner.combine(results) {
            Ok(combined) => combined,
            Err(err) => return ClauseOutcome::Failed(AnalysisError::from(err).to_string()),
        };

        let assessment = self.scorer.assess(
            &cleaned,
            &features.numeric_obligations,
            &features.conditional_language,
            Some(combined.risk),
        );
        let plain_english = self.plain_language.simplify(&combined.plain_english);
        let completeness = completeness_score(&cleaned, &plain_english, &features.entities);

        let original_words = word_count(&segment.body);
        let processing = ProcessingMetadata {
            original_word_count: original_words,
            cleaned_word_count: cleaned_words,
            cleaning_ratio: if original_words == 0 {
                0.0
            } else {
                cleaned_words as f64 / original_words as f64
            },
            has_numeric_obligations: !features.numeric_obligations.is_empty(),
            has_conditional_language: !features.conditional_language.is_empty(),
            chunk_count: chunks.len(),
            chunks_failed,
        };

        debug!(
            clause = %clause_id,
            clause_type = features.clause_type.as_str(),
            risk = assessment.level.as_str(),
            score = assessment.score,
            "clause analyzed"
        );

        let title = segment
            .title
            .clone()
            .or_else(|| self.features.extract_heading(&segment.body));

        ClauseOutcome::Analyzed(Box::new(Clause {
            id: clause_id,
            ordinal,
            number: segment.number.clone(),
            heading: Some(display_title(title.as_deref(), &cleaned)),
            original_text: cleaned,
            plain_english,
            user_impact: combined.user_impact,
            word_count: cleaned_words,
            contains_numbers: features.contains_numbers,
            contains_dates: features.contains_dates,
            contains_financial: features.contains_financial,
            clause_type: features.clause_type,
            key_entities: features.entities,
            numeric_obligations: features.numeric_obligations,
            conditional_language: features.conditional_language,
            risk_level: assessment.level,
            risk_score: assessment.score,
            risk_reason: assessment.rationale,
            confidence_score: combined.confidence.unwrap_or(DEFAULT_SUMMARY_CONFIDENCE),
            completeness_score: completeness,
            processing,
        }))
    }
}

/// With entities: the share whose value shows up in the summary. Without: summary
/// length relative to a tenth of the original.
pub fn completeness_score(original: &str, summary: &str, entities: &[String]) -> f64 {
    if entities.is_empty() {
        let original_words = word_count(original) as f64;
        let summary_words = word_count(summary) as f64;
        let expected = (original_words * SUMMARY_LENGTH_RATIO).max(MIN_SUMMARY_WORD_BASE);
        return (summary_words / expected).min(1.0);
    }

    let lowered = summary.to_lowercase();
    let preserved = entities
        .iter()
        .filter(|entity| {
            let value = entity.rsplit(':').next().unwrap_or(entity.as_str());
            value
                .to_lowercase()
                .split_whitespace()
                .any(|part| lowered.contains(part))
        })
        .count();
    (preserved as f64 / entities.len() as f64).min(1.0)
}
