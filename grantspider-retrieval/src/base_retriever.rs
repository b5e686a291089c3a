use async_trait::async_trait;
use grantspider_core::SearchResult;

use crate::error::RetrievalError;

/// Base trait for document retrievers.
///
/// Implementations return at most `top_k` results, most relevant first.
/// Backends that cannot be reached report `StoreError::Unavailable`.
#[async_trait]
pub trait BaseRetriever: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, RetrievalError>;
}
