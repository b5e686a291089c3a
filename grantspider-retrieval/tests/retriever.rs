use std::collections::HashMap;

use async_trait::async_trait;
use grantspider_core::{Document, Embedding, EmbeddingError};
use grantspider_retrieval::{
    BaseRetriever, HashEmbedder, InMemoryVectorStore, Indexer, RetrievalError, Retriever,
};

fn text_doc(id: &str, content: &str) -> Document {
    Document {
        id: id.to_string(),
        content: content.to_string(),
        metadata: HashMap::new(),
        embedding: None,
    }
}

#[tokio::test]
async fn hash_embedder_is_deterministic_and_normalised() {
    let embedder = HashEmbedder::new(64);
    let first = embedder.embed("AMIF health grant").await.expect("embed");
    let second = embedder.embed("amif HEALTH grant").await.expect("embed");
    assert_eq!(first, second);
    let norm: f32 = first.iter().map(|v| v * v).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
    assert_eq!(embedder.dimension(), 64);
}

#[tokio::test]
async fn retriever_prefers_documents_sharing_vocabulary() {
    let store = InMemoryVectorStore::new();
    let indexer = Indexer::new(HashEmbedder::new(256), store.clone());
    indexer
        .add_documents(vec![
            text_doc("budget", "personnel costs and budget ceilings for the project"),
            text_doc("health", "eligibility criteria for health grants and medical services"),
            text_doc("digital", "digital tools for online language courses"),
        ])
        .await
        .expect("index");

    let retriever = Retriever::new(HashEmbedder::new(256), store);
    let results = retriever
        .retrieve("eligibility criteria health grants", 2)
        .await
        .expect("retrieve");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].document.id, "health");
}

#[tokio::test]
async fn indexer_rejects_blank_ids() {
    let indexer = Indexer::new(HashEmbedder::new(8), InMemoryVectorStore::new());
    let err = indexer
        .add_documents(vec![text_doc("  ", "text")])
        .await
        .expect_err("blank id");
    assert!(err.to_string().contains("invalid document id"));
}

/// Returns a single vector no matter how many texts it is given.
struct TruncatingEmbedder;

#[async_trait]
impl Embedding for TruncatingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![1.0, 0.0])
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(vec![vec![1.0, 0.0]])
    }

    fn dimension(&self) -> usize {
        2
    }
}

#[tokio::test]
async fn indexer_rejects_short_embedding_batches() {
    let store = InMemoryVectorStore::new();
    let indexer = Indexer::new(TruncatingEmbedder, store.clone());
    let err = indexer
        .add_documents(vec![text_doc("a", "first"), text_doc("b", "second")])
        .await
        .expect_err("short batch");

    assert!(matches!(
        err,
        RetrievalError::Embedding(EmbeddingError::InvalidResponse(ref message))
            if message == "expected 2 vectors, got 1"
    ));
    let retriever = Retriever::new(TruncatingEmbedder, store);
    assert!(retriever.retrieve("first", 5).await.expect("search").is_empty());
}
