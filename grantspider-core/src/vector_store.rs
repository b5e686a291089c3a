use async_trait::async_trait;

use crate::{Chunk, Document, StoreError};

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
}

impl From<SearchResult> for Chunk {
    fn from(result: SearchResult) -> Self {
        Chunk {
            content: result.document.content,
            metadata: result.document.metadata,
            similarity_score: Some(result.score),
        }
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn add(&self, docs: Vec<Document>) -> Result<(), StoreError>;
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>, StoreError>;
    async fn delete(&self, ids: &[String]) -> Result<(), StoreError>;
}
