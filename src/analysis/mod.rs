mod chunking;
mod combine;
mod doc_kind;
mod features;
mod normalize;
mod pipeline;
mod risk;
mod segment;
mod simplify;
#[cfg(test)]
mod tests;

pub use chunking::chunk_text;
pub use combine::ChunkCombiner;
pub use doc_kind::detect_document_kind;
pub use features::FeatureExtractor;
pub use normalize::{TextNormalizer, word_count};
pub use pipeline::{ClauseAnalyzer, completeness_score};
pub use risk::RiskScorer;
pub use segment::{ClauseSegmenter, RawSegment, assign_clause_ids, display_title};
pub use simplify::PlainLanguage;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub chunk_word_limit: usize,
    pub min_document_chars: usize,
    pub min_clause_chars: usize,
    pub boilerplate_clause_words: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            chunk_word_limit: 200,
            min_document_chars: 50,
            min_clause_chars: 10,
            boilerplate_clause_words: 15,
        }
    }
}
