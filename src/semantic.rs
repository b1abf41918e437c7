use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Orders candidate texts by relevance to a query.
pub trait ClauseRanker {
    /// Indices into `texts`, best first, at most `top_k`.
    fn rank(&self, texts: &[&str], query: &str, top_k: usize) -> Vec<usize>;
}

/// Hashed word and bigram features, L2-normalized, compared by cosine similarity.
#[derive(Debug, Clone, Copy)]
pub struct LocalHashRanker {
    dimensions: usize,
}

impl Default for LocalHashRanker {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl LocalHashRanker {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(8),
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0_f32; self.dimensions];
        for feature in token_features(text) {
            let hash = stable_hash(&feature);
            let index = (hash as usize) % self.dimensions;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            let weight = 1.0 + (((hash >> 48) & 0xFF) as f32 / 255.0);
            vector[index] += sign * weight;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl ClauseRanker for LocalHashRanker {
    fn rank(&self, texts: &[&str], query: &str, top_k: usize) -> Vec<usize> {
        let query_vector = self.embed(query);
        let mut scored = texts
            .iter()
            .enumerate()
            .map(|(index, text)| (index, cosine_similarity(&query_vector, &self.embed(text))))
            .collect::<Vec<(usize, f64)>>();

        scored.sort_by(|left, right| right.1.total_cmp(&left.1).then(left.0.cmp(&right.0)));
        scored
            .into_iter()
            .take(top_k)
            .map(|(index, _)| index)
            .collect()
    }
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    left.iter()
        .zip(right.iter())
        .map(|(left_value, right_value)| f64::from(*left_value) * f64::from(*right_value))
        .sum::<f64>()
}

fn stable_hash(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn token_features(text: &str) -> Vec<String> {
    let words = text
        .split_whitespace()
        .map(|value| {
            value
                .chars()
                .filter(|character| character.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|value| !value.is_empty())
        .collect::<Vec<String>>();

    let mut features = Vec::<String>::with_capacity(words.len() * 2);
    for (index, word) in words.iter().enumerate() {
        features.push(format!("w:{word}"));
        if let Some(next) = words.get(index + 1) {
            features.push(format!("b:{word}_{next}"));
        }
    }
    features
}

fn l2_normalize(values: &mut [f32]) {
    let norm = values
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>()
        .sqrt() as f32;

    if norm > 0.0 {
        for value in values {
            *value /= norm;
        }
    }
}
