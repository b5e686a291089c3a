use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrantSpiderError {
    #[error("LLM provider failed: {0}")]
    LlmProvider(String),
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Custom(String),
}

impl From<EmbeddingError> for GrantSpiderError {
    fn from(err: EmbeddingError) -> Self {
        GrantSpiderError::Custom(err.to_string())
    }
}

impl From<StoreError> for GrantSpiderError {
    fn from(err: StoreError) -> Self {
        GrantSpiderError::Custom(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("invalid document id: {0}")]
    InvalidId(String),
    #[error("document '{0}' is missing an embedding")]
    MissingEmbedding(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
