use std::path::PathBuf;

use thiserror::Error;
use grantspider_core::{EmbeddingError, StoreError};

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid document id: {0}")]
    InvalidId(String),
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no text documents found in {0}")]
    EmptyCorpus(PathBuf),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}
