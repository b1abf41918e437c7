use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("input rejected: {0}")]
    Input(String),

    #[error("no segmentation strategy produced a clause")]
    Segmentation,

    #[error(transparent)]
    Combine(#[from] CombineError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CombineError {
    #[error("cannot combine an empty set of chunk results")]
    EmptyInput,
}

#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("summarizer call failed: {0}")]
    Transient(String),

    #[error("malformed summarizer response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("no text could be extracted from {}", .0.display())]
    EmptyExtraction(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed for {}: {message}", path.display())]
    ToolFailed {
        tool: &'static str,
        path: PathBuf,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode stored analysis: {0}")]
    Json(#[from] serde_json::Error),
}
