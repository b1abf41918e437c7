use anyhow::Result;

use crate::analysis::{FeatureExtractor, RiskScorer};
use crate::error::SummarizerError;
use crate::model::{ChunkResult, ClauseType};

use super::{ChunkSummarizer, SummaryRequest};

const HEURISTIC_CONFIDENCE: f64 = 0.8;
const MENTIONED_ENTITIES: usize = 2;

/// Offline summarizer built from the extracted features. Deterministic, never fails.
#[derive(Debug)]
pub struct HeuristicSummarizer {
    features: FeatureExtractor,
    scorer: RiskScorer,
}

impl HeuristicSummarizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            features: FeatureExtractor::new()?,
            scorer: RiskScorer::new()?,
        })
    }
}

impl ChunkSummarizer for HeuristicSummarizer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn summarize_chunk(
        &mut self,
        request: &SummaryRequest<'_>,
    ) -> Result<ChunkResult, SummarizerError> {
        let extracted = self.features.extract(request.text);
        let entities = if request.entities.is_empty() {
            extracted.entities.as_slice()
        } else {
            request.entities
        };

        let entity_text = if entities.is_empty() {
            "specific requirements".to_string()
        } else {
            entities
                .iter()
                .take(MENTIONED_ENTITIES)
                .map(|entity| {
                    entity
                        .rsplit(':')
                        .next()
                        .unwrap_or(entity.as_str())
                        .trim()
                        .to_string()
                })
                .collect::<Vec<String>>()
                .join(", ")
        };

        let subject = match request.clause_type.unwrap_or(extracted.clause_type) {
            ClauseType::General => "clause".to_string(),
            clause_type => format!("{clause_type} clause"),
        };

        let assessment = self.scorer.assess(
            request.text,
            &extracted.numeric_obligations,
            &extracted.conditional_language,
            None,
        );

        Ok(ChunkResult {
            plain_english: format!("This {subject} requires compliance with {entity_text}."),
            user_impact: format!(
                "You must follow these {}-risk requirements or face consequences.",
                assessment.level.as_str().to_lowercase()
            ),
            risk: assessment.level,
            confidence: Some(HEURISTIC_CONFIDENCE),
            reasoning: Some(assessment.rationale),
        })
    }
}
